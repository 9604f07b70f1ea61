use std::sync::Arc;

use chrono::Months;
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::clock::Clock;
use crate::error::{AppError, Result};
use crate::models::telemarketer::{NewTelemarketer, Telemarketer, TelemarketerUpdate};
use crate::models::user::User;
use crate::stores::telemarketer_store::TelemarketerStore;
use crate::validation::telemarketer::{validate_name, validate_performance_month};

/// Demo salespeople: name, current validated/pending, previous
/// validated/pending, monthly target.
const DEMO_SALESPEOPLE: [(&str, u32, u32, u32, u32, u32); 6] = [
    ("Marie Dupont", 85, 23, 72, 18, 100),
    ("Jean Laurent", 78, 15, 65, 22, 90),
    ("Sarah Moreau", 92, 28, 89, 15, 110),
    ("Lucas Petit", 67, 12, 58, 25, 80),
    ("Emma Leroy", 73, 19, 81, 12, 85),
    ("Antoine Roux", 88, 31, 76, 19, 95),
];

/// Telemarketer record management with a push channel: every mutation
/// broadcasts the resulting dataset to subscribers, newest month first.
#[derive(Clone)]
pub struct TelemarketerService {
    telemarketers: Arc<dyn TelemarketerStore>,
    clock: Arc<dyn Clock>,
    updates: broadcast::Sender<Vec<Telemarketer>>,
}

impl TelemarketerService {
    /// Creates a telemarketer service over the given store.
    pub fn new(telemarketers: Arc<dyn TelemarketerStore>, clock: Arc<dyn Clock>) -> Self {
        let (updates, _) = broadcast::channel(16);
        Self {
            telemarketers,
            clock,
            updates,
        }
    }

    /// Creates a record. Every salesperson must have a manager.
    ///
    /// # Arguments
    ///
    /// * `new` - The record fields.
    ///
    /// # Returns
    ///
    /// A `Result` containing the created `Telemarketer`.
    pub async fn create(&self, new: NewTelemarketer) -> Result<Telemarketer> {
        validate_name(&new.name)?;
        validate_performance_month(&new.performance_month)?;
        if new.manager_id.is_none() {
            return Err(AppError::Validation(
                "Telemarketers must be assigned a manager".to_string(),
            ));
        }

        let now = self.clock.now();
        let telemarketer = Telemarketer {
            id: Uuid::new_v4(),
            name: new.name,
            validated_sales: new.validated_sales,
            pending_sales: new.pending_sales,
            target: new.target,
            performance_month: new.performance_month,
            manager_id: new.manager_id,
            created_at: now,
            updated_at: now,
        };
        let telemarketer = self.telemarketers.insert(telemarketer).await?;

        tracing::info!(
            "➕ Telemarketer created: {} ({})",
            telemarketer.name,
            telemarketer.performance_month
        );
        self.publish().await;
        Ok(telemarketer)
    }

    /// Applies a partial update to a record. The manager assignment can
    /// move to another manager but never be cleared.
    pub async fn update(&self, id: Uuid, update: TelemarketerUpdate) -> Result<Telemarketer> {
        let mut telemarketer = self
            .telemarketers
            .get(id)
            .await?
            .ok_or(AppError::NotFound)?;

        if let Some(name) = update.name {
            validate_name(&name)?;
            telemarketer.name = name;
        }
        if let Some(validated) = update.validated_sales {
            telemarketer.validated_sales = validated;
        }
        if let Some(pending) = update.pending_sales {
            telemarketer.pending_sales = pending;
        }
        if let Some(target) = update.target {
            telemarketer.target = target;
        }
        if let Some(month) = update.performance_month {
            validate_performance_month(&month)?;
            telemarketer.performance_month = month;
        }
        if let Some(manager_id) = update.manager_id {
            telemarketer.manager_id = Some(manager_id);
        }

        telemarketer.updated_at = self.clock.now();
        let telemarketer = self.telemarketers.update(telemarketer).await?;

        self.publish().await;
        Ok(telemarketer)
    }

    /// Deletes a record.
    pub async fn delete(&self, id: Uuid) -> Result<()> {
        self.telemarketers.remove(id).await?;
        tracing::info!("🗑️ Telemarketer deleted: {}", id);
        self.publish().await;
        Ok(())
    }

    /// Looks up a record by id.
    pub async fn get(&self, id: Uuid) -> Result<Option<Telemarketer>> {
        self.telemarketers.get(id).await
    }

    /// Every record, newest performance month first.
    pub async fn list(&self) -> Result<Vec<Telemarketer>> {
        self.telemarketers.list().await
    }

    /// Subscribes to dataset snapshots pushed after every mutation.
    pub fn subscribe(&self) -> broadcast::Receiver<Vec<Telemarketer>> {
        self.updates.subscribe()
    }

    /// Seeds two months of demo records into an empty store, spreading
    /// salespeople over the given managers round-robin.
    ///
    /// # Returns
    ///
    /// How many records were created.
    pub async fn seed_demo_data(&self, managers: &[User]) -> Result<usize> {
        if self.telemarketers.count().await? > 0 {
            return Ok(0);
        }
        if managers.is_empty() {
            return Err(AppError::Validation(
                "Demo data needs at least one manager".to_string(),
            ));
        }

        let now = self.clock.now();
        let current_month = now.format("%Y-%m").to_string();
        let previous_month = now
            .date_naive()
            .checked_sub_months(Months::new(1))
            .map(|d| d.format("%Y-%m").to_string())
            .unwrap_or_else(|| current_month.clone());

        let mut created = 0;
        for (index, (name, validated, pending, prev_validated, prev_pending, target)) in
            DEMO_SALESPEOPLE.iter().enumerate()
        {
            let manager = &managers[index % managers.len()];
            for (month, validated_sales, pending_sales) in [
                (&current_month, *validated, *pending),
                (&previous_month, *prev_validated, *prev_pending),
            ] {
                self.create(NewTelemarketer {
                    name: (*name).to_string(),
                    validated_sales,
                    pending_sales,
                    target: *target,
                    performance_month: month.clone(),
                    manager_id: Some(manager.id),
                })
                .await?;
                created += 1;
            }
        }

        tracing::info!("✅ Seeded {} demo telemarketer records", created);
        Ok(created)
    }

    /// Wipes every record. Development utility.
    pub async fn reset_all_data(&self) -> Result<()> {
        self.telemarketers.clear().await?;
        tracing::warn!("🧹 All telemarketer records wiped");
        self.publish().await;
        Ok(())
    }

    /// Whether the backing store answers at all.
    pub async fn check_connection(&self) -> bool {
        match self.telemarketers.count().await {
            Ok(_) => true,
            Err(e) => {
                tracing::error!("❌ Telemarketer store unreachable: {}", e);
                false
            }
        }
    }

    /// Pushes the current dataset to subscribers, if there are any.
    async fn publish(&self) {
        if self.updates.receiver_count() == 0 {
            return;
        }
        match self.telemarketers.list().await {
            Ok(snapshot) => {
                let _ = self.updates.send(snapshot);
            }
            Err(e) => {
                tracing::warn!("⚠️ Failed to publish telemarketer snapshot: {}", e);
            }
        }
    }
}
