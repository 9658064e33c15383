use crate::SchedulerError;
use chrono::{DateTime, Datelike, NaiveDate, Utc, Weekday};
use cosmet_core::contracts::NotificationKind;
use cosmet_core::shelf_life::days_remaining;
use cosmet_storage::{InventoryStore, ItemRecord, NotificationDraft, StorageError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratorConfig {
    /// Weekday on which overdue reminders go out. `None` emits them on every
    /// run (dedup is still day-scoped).
    pub overdue_weekday: Option<Weekday>,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            overdue_weekday: Some(Weekday::Mon),
        }
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct GenerationReport {
    pub expired: usize,
    pub week: usize,
    pub biweek: usize,
    pub month: usize,
    pub items_scanned: usize,
}

impl GenerationReport {
    pub fn total_created(&self) -> usize {
        self.expired + self.week + self.biweek + self.month
    }
}

/// Idempotent reminder batch, intended for a daily cron. Threshold reminders
/// (D30/D14/D7) fire once per item and kind; overdue reminders recur on the
/// configured weekday. The whole run commits or rolls back as one unit so a
/// concurrent reader never sees a half-notified batch.
pub struct NotificationGenerator {
    config: GeneratorConfig,
}

impl NotificationGenerator {
    pub fn new(config: GeneratorConfig) -> Self {
        Self { config }
    }

    pub fn run(
        &self,
        store: &InventoryStore,
        today: NaiveDate,
        now: DateTime<Utc>,
    ) -> Result<GenerationReport, SchedulerError> {
        let report = store.in_transaction(|store| {
            let items = store.using_items()?;
            let mut report = GenerationReport {
                items_scanned: items.len(),
                ..GenerationReport::default()
            };

            let overdue_due = match self.config.overdue_weekday {
                Some(weekday) => today.weekday() == weekday,
                None => true,
            };
            if overdue_due {
                report.expired = self.generate_overdue(store, &items, today, now)?;
            }

            report.month =
                self.generate_threshold(store, &items, NotificationKind::D30, today, now)?;
            report.biweek =
                self.generate_threshold(store, &items, NotificationKind::D14, today, now)?;
            report.week =
                self.generate_threshold(store, &items, NotificationKind::D7, today, now)?;
            Ok(report)
        })?;

        tracing::info!(
            created = report.total_created(),
            scanned = report.items_scanned,
            "notification generation finished"
        );
        Ok(report)
    }

    fn generate_overdue(
        &self,
        store: &InventoryStore,
        items: &[ItemRecord],
        today: NaiveDate,
        now: DateTime<Utc>,
    ) -> Result<usize, StorageError> {
        let mut created = 0;
        for item in items.iter().filter(|item| item.expires_on < today) {
            let draft = NotificationDraft {
                user_id: item.user_id,
                item_id: item.item_id,
                kind: NotificationKind::Overweek,
                title: "使用期限切れのアイテムがあります".to_string(),
                body: format!(
                    "{}の使用期限が過ぎています（期限: {}）",
                    item.name, item.expires_on
                ),
                scheduled_for: now,
                scheduled_day: today,
            };
            if store.insert_notification(&draft, now)? {
                created += 1;
            }
        }
        Ok(created)
    }

    fn generate_threshold(
        &self,
        store: &InventoryStore,
        items: &[ItemRecord],
        kind: NotificationKind,
        today: NaiveDate,
        now: DateTime<Utc>,
    ) -> Result<usize, StorageError> {
        let threshold = kind.threshold_days().unwrap_or_default();
        let mut created = 0;
        for item in items {
            let days = days_remaining(item.expires_on, today);
            if !(0..=threshold).contains(&days) {
                continue;
            }
            let draft = NotificationDraft {
                user_id: item.user_id,
                item_id: item.item_id,
                kind,
                title: format!("期限{threshold}日以内のアイテムがあります"),
                body: format!(
                    "{}の使用期限が{}日後です（期限: {}）",
                    item.name, days, item.expires_on
                ),
                scheduled_for: now,
                scheduled_day: today,
            };
            if store.insert_notification(&draft, now)? {
                created += 1;
            }
        }
        Ok(created)
    }
}
