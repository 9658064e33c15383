use chrono::{DateTime, NaiveDate, Utc};
use cosmet_core::contracts::{ItemStatus, NotificationKind, SuggestTarget};
use cosmet_core::shelf_life::{days_remaining, risk_tier, RiskTier};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;

pub const INVENTORY_SCHEMA_VERSION: i64 = 1;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("timestamp parse error: {0}")]
    Timestamp(String),
    #[error("invalid stored value: {0}")]
    InvalidValue(String),
    #[error("unknown item {0}")]
    UnknownItem(i64),
    #[error("unknown suggestion record {0}")]
    UnknownSuggestion(i64),
    #[error("unsupported schema version {found}, max supported {supported}")]
    UnsupportedSchemaVersion { found: i64, supported: i64 },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemRecord {
    pub item_id: i64,
    pub user_id: i64,
    pub taxon_id: i64,
    pub name: String,
    pub brand: Option<String>,
    pub opened_on: NaiveDate,
    pub expires_on: NaiveDate,
    pub expires_overridden: bool,
    pub status: ItemStatus,
    pub finished_at: Option<NaiveDate>,
    pub risk_flag: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationDraft {
    pub user_id: i64,
    pub item_id: i64,
    pub kind: NotificationKind,
    pub title: String,
    pub body: String,
    pub scheduled_for: DateTime<Utc>,
    pub scheduled_day: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationRecord {
    pub notification_id: i64,
    pub user_id: i64,
    pub item_id: i64,
    pub kind: NotificationKind,
    pub title: String,
    pub body: String,
    pub scheduled_for: DateTime<Utc>,
    pub scheduled_day: NaiveDate,
    pub read_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl NotificationRecord {
    pub fn is_read(&self) -> bool {
        self.read_at.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuggestionAuditRecord {
    pub record_id: i64,
    pub user_id: i64,
    pub item_id: Option<i64>,
    pub target: SuggestTarget,
    pub suggested_taxon_id: Option<i64>,
    pub chosen_taxon_id: Option<i64>,
    pub accepted: bool,
    pub created_at: DateTime<Utc>,
}

/// Per-bucket counts for the expiry summary chart. Buckets follow the
/// mutually exclusive day-offset partition of `RiskTier`.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ExpiryStats {
    pub expired: usize,
    pub week: usize,
    pub biweek: usize,
    pub month: usize,
    pub safe: usize,
}

pub struct InventoryStore {
    conn: Connection,
}

impl InventoryStore {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let conn = Connection::open(path)?;
        let store = Self { conn };
        store.migrate()?;
        Ok(store)
    }

    pub fn open_in_memory() -> Result<Self, StorageError> {
        let conn = Connection::open_in_memory()?;
        let store = Self { conn };
        store.migrate()?;
        Ok(store)
    }

    pub fn schema_version(&self) -> Result<i64, StorageError> {
        Ok(self
            .conn
            .query_row("PRAGMA user_version", [], |row| row.get(0))?)
    }

    pub fn migrate(&self) -> Result<(), StorageError> {
        let current = self.schema_version()?;
        if current > INVENTORY_SCHEMA_VERSION {
            return Err(StorageError::UnsupportedSchemaVersion {
                found: current,
                supported: INVENTORY_SCHEMA_VERSION,
            });
        }

        if current < 1 {
            let sql = include_str!("../migrations/0001_inventory_schema.sql");
            self.conn.execute_batch(sql)?;
            self.conn
                .execute("PRAGMA user_version = 1", [])
                .map(|_| ())?;
        }

        Ok(())
    }

    /// Runs `f` inside one transaction; any error rolls the whole batch
    /// back. Used by the notification generator so a partial run is never
    /// visible to concurrent readers.
    pub fn in_transaction<T>(
        &self,
        f: impl FnOnce(&Self) -> Result<T, StorageError>,
    ) -> Result<T, StorageError> {
        let tx = self.conn.unchecked_transaction()?;
        let out = f(self)?;
        tx.commit()?;
        Ok(out)
    }

    pub fn upsert_item(&self, item: &ItemRecord) -> Result<(), StorageError> {
        self.conn.execute(
            "
            INSERT INTO items (
                item_id, user_id, taxon_id, name, brand,
                opened_on, expires_on, expires_overridden,
                status, finished_at, risk_flag, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
            ON CONFLICT(item_id) DO UPDATE SET
                user_id=excluded.user_id,
                taxon_id=excluded.taxon_id,
                name=excluded.name,
                brand=excluded.brand,
                opened_on=excluded.opened_on,
                expires_on=excluded.expires_on,
                expires_overridden=excluded.expires_overridden,
                status=excluded.status,
                finished_at=excluded.finished_at,
                risk_flag=excluded.risk_flag,
                updated_at=excluded.updated_at
            ",
            params![
                item.item_id,
                item.user_id,
                item.taxon_id,
                item.name,
                item.brand,
                item.opened_on.to_string(),
                item.expires_on.to_string(),
                item.expires_overridden as i64,
                item.status.as_str(),
                item.finished_at.map(|d| d.to_string()),
                item.risk_flag,
                item.created_at.to_rfc3339(),
                item.updated_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    pub fn item(&self, item_id: i64) -> Result<Option<ItemRecord>, StorageError> {
        self.conn
            .query_row(
                "SELECT item_id, user_id, taxon_id, name, brand, opened_on, expires_on,
                        expires_overridden, status, finished_at, risk_flag, created_at, updated_at
                 FROM items WHERE item_id = ?1",
                params![item_id],
                item_from_row,
            )
            .optional()?
            .transpose()
    }

    pub fn require_item(&self, item_id: i64) -> Result<ItemRecord, StorageError> {
        self.item(item_id)?
            .ok_or(StorageError::UnknownItem(item_id))
    }

    /// All items still in use, ordered by expiry then id. This is the
    /// working set for the notification batch and the stats summary.
    pub fn using_items(&self) -> Result<Vec<ItemRecord>, StorageError> {
        let mut statement = self.conn.prepare(
            "SELECT item_id, user_id, taxon_id, name, brand, opened_on, expires_on,
                    expires_overridden, status, finished_at, risk_flag, created_at, updated_at
             FROM items WHERE status = 'using' ORDER BY expires_on, item_id",
        )?;
        let rows = statement.query_map([], item_from_row)?;
        let mut out = Vec::new();
        for row in rows {
            out.push(row??);
        }
        Ok(out)
    }

    pub fn using_items_for_user(&self, user_id: i64) -> Result<Vec<ItemRecord>, StorageError> {
        let mut statement = self.conn.prepare(
            "SELECT item_id, user_id, taxon_id, name, brand, opened_on, expires_on,
                    expires_overridden, status, finished_at, risk_flag, created_at, updated_at
             FROM items WHERE status = 'using' AND user_id = ?1 ORDER BY expires_on, item_id",
        )?;
        let rows = statement.query_map(params![user_id], item_from_row)?;
        let mut out = Vec::new();
        for row in rows {
            out.push(row??);
        }
        Ok(out)
    }

    /// Inserts unless an equivalent notification already exists; the unique
    /// indexes carry the dedup rule (one-shot per kind, day-scoped for
    /// OVERWEEK). Returns whether a row was written.
    pub fn insert_notification(
        &self,
        draft: &NotificationDraft,
        now: DateTime<Utc>,
    ) -> Result<bool, StorageError> {
        let changes = self.conn.execute(
            "
            INSERT OR IGNORE INTO notifications (
                user_id, item_id, kind, title, body,
                scheduled_for, scheduled_day, read_at, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, NULL, ?8)
            ",
            params![
                draft.user_id,
                draft.item_id,
                draft.kind.as_str(),
                draft.title,
                draft.body,
                draft.scheduled_for.to_rfc3339(),
                draft.scheduled_day.to_string(),
                now.to_rfc3339(),
            ],
        )?;
        Ok(changes > 0)
    }

    pub fn notifications_for_user(
        &self,
        user_id: i64,
    ) -> Result<Vec<NotificationRecord>, StorageError> {
        let mut statement = self.conn.prepare(
            "SELECT notification_id, user_id, item_id, kind, title, body,
                    scheduled_for, scheduled_day, read_at, created_at
             FROM notifications WHERE user_id = ?1
             ORDER BY scheduled_for DESC, notification_id DESC",
        )?;
        let rows = statement.query_map(params![user_id], notification_from_row)?;
        let mut out = Vec::new();
        for row in rows {
            out.push(row??);
        }
        Ok(out)
    }

    pub fn unread_count(&self, user_id: i64) -> Result<usize, StorageError> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM notifications WHERE user_id = ?1 AND read_at IS NULL",
            params![user_id],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }

    pub fn mark_read(
        &self,
        notification_id: i64,
        now: DateTime<Utc>,
    ) -> Result<bool, StorageError> {
        let changes = self.conn.execute(
            "UPDATE notifications SET read_at = ?2 WHERE notification_id = ?1 AND read_at IS NULL",
            params![notification_id, now.to_rfc3339()],
        )?;
        Ok(changes > 0)
    }

    pub fn mark_all_read(&self, user_id: i64, now: DateTime<Utc>) -> Result<usize, StorageError> {
        let changes = self.conn.execute(
            "UPDATE notifications SET read_at = ?2 WHERE user_id = ?1 AND read_at IS NULL",
            params![user_id, now.to_rfc3339()],
        )?;
        Ok(changes)
    }

    /// One audit row per emitted suggestion, `accepted` false until the user
    /// confirms or overrides. Returns the new record id.
    pub fn insert_suggestion(
        &self,
        user_id: i64,
        item_id: Option<i64>,
        target: SuggestTarget,
        suggested_taxon_id: Option<i64>,
        now: DateTime<Utc>,
    ) -> Result<i64, StorageError> {
        self.conn.execute(
            "
            INSERT INTO suggestion_log (
                user_id, item_id, target, suggested_taxon_id,
                chosen_taxon_id, accepted, created_at
            ) VALUES (?1, ?2, ?3, ?4, NULL, 0, ?5)
            ",
            params![
                user_id,
                item_id,
                target.as_str(),
                suggested_taxon_id,
                now.to_rfc3339(),
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    pub fn suggestion(
        &self,
        record_id: i64,
    ) -> Result<Option<SuggestionAuditRecord>, StorageError> {
        self.conn
            .query_row(
                "SELECT record_id, user_id, item_id, target, suggested_taxon_id,
                        chosen_taxon_id, accepted, created_at
                 FROM suggestion_log WHERE record_id = ?1",
                params![record_id],
                suggestion_from_row,
            )
            .optional()?
            .transpose()
    }

    /// Patches the audit row with the user's final choice. `accepted` is
    /// computed, not supplied: the suggestion was accepted iff the chosen
    /// taxon is the suggested one. Rows are never deleted.
    pub fn confirm_suggestion(
        &self,
        record_id: i64,
        chosen_taxon_id: i64,
    ) -> Result<SuggestionAuditRecord, StorageError> {
        let record = self
            .suggestion(record_id)?
            .ok_or(StorageError::UnknownSuggestion(record_id))?;
        let accepted = record.suggested_taxon_id == Some(chosen_taxon_id);
        self.conn.execute(
            "UPDATE suggestion_log SET chosen_taxon_id = ?2, accepted = ?3 WHERE record_id = ?1",
            params![record_id, chosen_taxon_id, accepted as i64],
        )?;
        Ok(SuggestionAuditRecord {
            chosen_taxon_id: Some(chosen_taxon_id),
            accepted,
            ..record
        })
    }

    /// (accepted, confirmed) counts for offline quality evaluation of the
    /// classifier. Unconfirmed rows are excluded from the denominator.
    pub fn suggestion_acceptance(
        &self,
        target: SuggestTarget,
    ) -> Result<(usize, usize), StorageError> {
        let (accepted, confirmed): (i64, i64) = self.conn.query_row(
            "SELECT COALESCE(SUM(accepted), 0), COUNT(*)
             FROM suggestion_log WHERE target = ?1 AND chosen_taxon_id IS NOT NULL",
            params![target.as_str()],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?;
        Ok((accepted as usize, confirmed as usize))
    }

    pub fn expiry_stats(
        &self,
        user_id: i64,
        today: NaiveDate,
    ) -> Result<ExpiryStats, StorageError> {
        let mut stats = ExpiryStats::default();
        for item in self.using_items_for_user(user_id)? {
            match risk_tier(days_remaining(item.expires_on, today)) {
                RiskTier::Expired => stats.expired += 1,
                RiskTier::Critical => stats.week += 1,
                RiskTier::Warning => stats.biweek += 1,
                RiskTier::Caution => stats.month += 1,
                RiskTier::Safe => stats.safe += 1,
            }
        }
        Ok(stats)
    }
}

fn item_from_row(row: &Row<'_>) -> rusqlite::Result<Result<ItemRecord, StorageError>> {
    let opened_on: String = row.get(5)?;
    let expires_on: String = row.get(6)?;
    let status: String = row.get(8)?;
    let finished_at: Option<String> = row.get(9)?;
    let created_at: String = row.get(11)?;
    let updated_at: String = row.get(12)?;

    Ok(build_item(
        row.get(0)?,
        row.get(1)?,
        row.get(2)?,
        row.get(3)?,
        row.get(4)?,
        opened_on,
        expires_on,
        row.get::<_, i64>(7)? != 0,
        status,
        finished_at,
        row.get(10)?,
        created_at,
        updated_at,
    ))
}

#[allow(clippy::too_many_arguments)]
fn build_item(
    item_id: i64,
    user_id: i64,
    taxon_id: i64,
    name: String,
    brand: Option<String>,
    opened_on: String,
    expires_on: String,
    expires_overridden: bool,
    status: String,
    finished_at: Option<String>,
    risk_flag: Option<String>,
    created_at: String,
    updated_at: String,
) -> Result<ItemRecord, StorageError> {
    Ok(ItemRecord {
        item_id,
        user_id,
        taxon_id,
        name,
        brand,
        opened_on: parse_date(&opened_on)?,
        expires_on: parse_date(&expires_on)?,
        expires_overridden,
        status: ItemStatus::from_str(&status).map_err(StorageError::InvalidValue)?,
        finished_at: finished_at.as_deref().map(parse_date).transpose()?,
        risk_flag,
        created_at: parse_ts(&created_at)?,
        updated_at: parse_ts(&updated_at)?,
    })
}

fn notification_from_row(
    row: &Row<'_>,
) -> rusqlite::Result<Result<NotificationRecord, StorageError>> {
    let kind: String = row.get(3)?;
    let scheduled_for: String = row.get(6)?;
    let scheduled_day: String = row.get(7)?;
    let read_at: Option<String> = row.get(8)?;
    let created_at: String = row.get(9)?;

    Ok((|| {
        Ok(NotificationRecord {
            notification_id: row_get(row, 0)?,
            user_id: row_get(row, 1)?,
            item_id: row_get(row, 2)?,
            kind: NotificationKind::from_str(&kind).map_err(StorageError::InvalidValue)?,
            title: row_get(row, 4)?,
            body: row_get(row, 5)?,
            scheduled_for: parse_ts(&scheduled_for)?,
            scheduled_day: parse_date(&scheduled_day)?,
            read_at: read_at.as_deref().map(parse_ts).transpose()?,
            created_at: parse_ts(&created_at)?,
        })
    })())
}

fn suggestion_from_row(
    row: &Row<'_>,
) -> rusqlite::Result<Result<SuggestionAuditRecord, StorageError>> {
    let target: String = row.get(3)?;
    let created_at: String = row.get(7)?;

    Ok((|| {
        Ok(SuggestionAuditRecord {
            record_id: row_get(row, 0)?,
            user_id: row_get(row, 1)?,
            item_id: row_get(row, 2)?,
            target: SuggestTarget::from_str(&target).map_err(StorageError::InvalidValue)?,
            suggested_taxon_id: row_get(row, 4)?,
            chosen_taxon_id: row_get(row, 5)?,
            accepted: row_get::<i64>(row, 6)? != 0,
            created_at: parse_ts(&created_at)?,
        })
    })())
}

fn row_get<T: rusqlite::types::FromSql>(row: &Row<'_>, index: usize) -> Result<T, StorageError> {
    Ok(row.get(index)?)
}

fn parse_date(value: &str) -> Result<NaiveDate, StorageError> {
    value
        .parse::<NaiveDate>()
        .map_err(|err| StorageError::Timestamp(format!("{value}: {err}")))
}

fn parse_ts(value: &str) -> Result<DateTime<Utc>, StorageError> {
    DateTime::parse_from_rfc3339(value)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|err| StorageError::Timestamp(format!("{value}: {err}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn ts(offset_secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_771_840_800 + offset_secs, 0)
            .single()
            .expect("valid ts")
    }

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    fn sample_item(item_id: i64, user_id: i64, expires_on: NaiveDate) -> ItemRecord {
        ItemRecord {
            item_id,
            user_id,
            taxon_id: 42,
            name: "ラッシュセンセーション".to_string(),
            brand: Some("資生堂".to_string()),
            opened_on: day(2026, 5, 1),
            expires_on,
            expires_overridden: false,
            status: ItemStatus::Using,
            finished_at: None,
            risk_flag: None,
            created_at: ts(0),
            updated_at: ts(0),
        }
    }

    #[test]
    fn items_round_trip_through_sqlite() {
        let store = InventoryStore::open_in_memory().expect("db");
        let item = sample_item(1, 7, day(2026, 11, 1));
        store.upsert_item(&item).expect("upsert");

        let loaded = store.item(1).expect("load").expect("exists");
        assert_eq!(loaded, item);

        let mut updated = item.clone();
        updated.status = ItemStatus::Finished;
        updated.finished_at = Some(day(2026, 8, 23));
        store.upsert_item(&updated).expect("update");
        assert_eq!(store.item(1).expect("load").expect("exists"), updated);
        assert!(store.using_items().expect("using").is_empty());
    }

    #[test]
    fn open_persists_to_disk() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("inventory.sqlite3");
        {
            let store = InventoryStore::open(&path).expect("db");
            store
                .upsert_item(&sample_item(1, 7, day(2026, 11, 1)))
                .expect("upsert");
        }
        let reopened = InventoryStore::open(&path).expect("reopen");
        assert_eq!(reopened.schema_version().expect("version"), 1);
        assert!(reopened.item(1).expect("load").is_some());
    }

    #[test]
    fn threshold_notifications_dedup_per_kind() {
        let store = InventoryStore::open_in_memory().expect("db");
        store
            .upsert_item(&sample_item(1, 7, day(2026, 9, 1)))
            .expect("item");

        let draft = NotificationDraft {
            user_id: 7,
            item_id: 1,
            kind: NotificationKind::D7,
            title: "期限7日以内のアイテムがあります".to_string(),
            body: "ラッシュセンセーションの使用期限が5日後です".to_string(),
            scheduled_for: ts(0),
            scheduled_day: day(2026, 8, 23),
        };
        assert!(store.insert_notification(&draft, ts(0)).expect("first insert"));
        assert!(!store.insert_notification(&draft, ts(1)).expect("duplicate"));

        // Same kind on a later day is still suppressed: thresholds fire once.
        let later = NotificationDraft {
            scheduled_day: day(2026, 8, 24),
            scheduled_for: ts(86_400),
            ..draft
        };
        assert!(!store.insert_notification(&later, ts(86_400)).expect("later duplicate"));
    }

    #[test]
    fn overweek_notifications_dedup_per_day_only() {
        let store = InventoryStore::open_in_memory().expect("db");
        let draft = NotificationDraft {
            user_id: 7,
            item_id: 1,
            kind: NotificationKind::Overweek,
            title: "使用期限切れのアイテムがあります".to_string(),
            body: "期限が過ぎています".to_string(),
            scheduled_for: ts(0),
            scheduled_day: day(2026, 8, 23),
        };
        assert!(store.insert_notification(&draft, ts(0)).expect("monday"));
        assert!(!store.insert_notification(&draft, ts(1)).expect("same day again"));

        let next_week = NotificationDraft {
            scheduled_day: day(2026, 8, 30),
            scheduled_for: ts(7 * 86_400),
            ..draft
        };
        assert!(store.insert_notification(&next_week, ts(7 * 86_400)).expect("next week"));
    }

    #[test]
    fn unread_accounting_and_mark_read() {
        let store = InventoryStore::open_in_memory().expect("db");
        for (kind, item_id) in [(NotificationKind::D30, 1), (NotificationKind::D14, 2)] {
            store
                .insert_notification(&NotificationDraft {
                    user_id: 7,
                    item_id,
                    kind,
                    title: "t".to_string(),
                    body: "b".to_string(),
                    scheduled_for: ts(0),
                    scheduled_day: day(2026, 8, 23),
                }, ts(5))
                .expect("insert");
        }
        assert_eq!(store.unread_count(7).expect("unread"), 2);

        let first = store.notifications_for_user(7).expect("list")[0].clone();
        assert!(!first.is_read());
        assert!(store.mark_read(first.notification_id, ts(10)).expect("read"));
        assert!(!store.mark_read(first.notification_id, ts(20)).expect("read twice"));
        assert_eq!(store.unread_count(7).expect("unread"), 1);

        assert_eq!(store.mark_all_read(7, ts(30)).expect("mark all"), 1);
        assert_eq!(store.unread_count(7).expect("unread"), 0);
    }

    #[test]
    fn created_at_records_the_insert_instant_not_the_schedule() {
        let store = InventoryStore::open_in_memory().expect("db");
        let draft = NotificationDraft {
            user_id: 7,
            item_id: 1,
            kind: NotificationKind::D30,
            title: "t".to_string(),
            body: "b".to_string(),
            scheduled_for: ts(0),
            scheduled_day: day(2026, 8, 23),
        };
        assert!(store.insert_notification(&draft, ts(600)).expect("insert"));

        let record = store.notifications_for_user(7).expect("list")[0].clone();
        assert_eq!(record.scheduled_for, ts(0));
        assert_eq!(record.created_at, ts(600));
    }

    #[test]
    fn suggestion_log_is_append_and_patch() {
        let store = InventoryStore::open_in_memory().expect("db");
        let record_id = store
            .insert_suggestion(7, None, SuggestTarget::Category, Some(42), ts(0))
            .expect("insert");

        let record = store.suggestion(record_id).expect("load").expect("exists");
        assert!(!record.accepted);
        assert_eq!(record.chosen_taxon_id, None);
        assert_eq!(record.suggested_taxon_id, Some(42));

        let confirmed = store.confirm_suggestion(record_id, 42).expect("confirm");
        assert!(confirmed.accepted);
        assert_eq!(confirmed.chosen_taxon_id, Some(42));

        let overridden_id = store
            .insert_suggestion(7, Some(1), SuggestTarget::Category, Some(42), ts(5))
            .expect("insert");
        let overridden = store.confirm_suggestion(overridden_id, 99).expect("confirm");
        assert!(!overridden.accepted);

        assert_eq!(
            store
                .suggestion_acceptance(SuggestTarget::Category)
                .expect("acceptance"),
            (1, 2)
        );
        assert!(matches!(
            store.confirm_suggestion(999, 1),
            Err(StorageError::UnknownSuggestion(999))
        ));
    }

    #[test]
    fn expiry_stats_bucket_using_items() {
        let store = InventoryStore::open_in_memory().expect("db");
        let today = day(2026, 8, 23);
        let offsets = [-2_i64, 0, 7, 8, 14, 15, 30, 31, 120];
        for (index, offset) in offsets.iter().enumerate() {
            let expires = today + chrono::Duration::days(*offset);
            store
                .upsert_item(&sample_item(index as i64 + 1, 7, expires))
                .expect("item");
        }
        // Another user's items stay out of the summary.
        store
            .upsert_item(&sample_item(100, 8, today))
            .expect("other user");

        let stats = store.expiry_stats(7, today).expect("stats");
        assert_eq!(
            stats,
            ExpiryStats {
                expired: 1,
                week: 2,
                biweek: 2,
                month: 2,
                safe: 2,
            }
        );
    }

    #[test]
    fn transaction_rolls_back_on_error() {
        let store = InventoryStore::open_in_memory().expect("db");
        let result: Result<(), StorageError> = store.in_transaction(|store| {
            store.insert_notification(&NotificationDraft {
                user_id: 7,
                item_id: 1,
                kind: NotificationKind::D7,
                title: "t".to_string(),
                body: "b".to_string(),
                scheduled_for: ts(0),
                scheduled_day: day(2026, 8, 23),
            }, ts(0))?;
            Err(StorageError::UnknownItem(1))
        });
        assert!(result.is_err());
        assert_eq!(store.unread_count(7).expect("unread"), 0);
    }
}
