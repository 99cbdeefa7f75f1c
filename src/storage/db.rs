use chrono::{DateTime, Utc};
use rusqlite::{params, types::Type, Connection, OptionalExtension, Row};

use crate::{
    error::{MaintenanceError, Result},
    storage::{
        models::{
            Account, CachedPrice, ChatMessage, IncentiveProfile, LightningPayment, OnchainPayment,
            OnchainStatus, Order, OrderContext, OrderStatus, Participant, PaymentStatus,
            RewardCandidate,
        },
        ports::{AccountStore, EngagementOracle, OrderStore, PaymentStore, PriceStore, RewardStore},
    },
};

const LIGHTNING_COLUMNS: &str = "p.payment_hash, p.invoice, p.num_satoshis, p.routing_budget_ppm, \
     p.status, p.last_routing_time, om.expires_at, ot.expires_at";

const LIGHTNING_JOINS: &str = "FROM ln_payments p \
     LEFT JOIN orders om ON om.id = p.order_made_id \
     LEFT JOIN orders ot ON ot.id = p.order_taken_id";

pub struct Database {
    conn: Connection,
}

impl Database {
    pub fn new(path: &str) -> Result<Self> {
        let conn = Connection::open(path)?;
        let db = Self { conn };
        db.init_schema()?;
        Ok(db)
    }

    pub fn in_memory() -> Result<Self> {
        let db = Self {
            conn: Connection::open_in_memory()?,
        };
        db.init_schema()?;
        Ok(db)
    }

    fn init_schema(&self) -> Result<()> {
        self.conn.execute_batch(
            "PRAGMA foreign_keys = ON;

            CREATE TABLE IF NOT EXISTS accounts (
                id INTEGER PRIMARY KEY,
                username TEXT NOT NULL UNIQUE,
                is_privileged INTEGER NOT NULL DEFAULT 0,
                last_login INTEGER
            );

            CREATE TABLE IF NOT EXISTS profiles (
                account_id INTEGER PRIMARY KEY REFERENCES accounts(id) ON DELETE CASCADE,
                pending_rewards INTEGER NOT NULL DEFAULT 0,
                earned_rewards INTEGER NOT NULL DEFAULT 0,
                claimed_rewards INTEGER NOT NULL DEFAULT 0,
                telegram_enabled INTEGER NOT NULL DEFAULT 0,
                telegram_chat_id INTEGER,
                total_contracts INTEGER NOT NULL DEFAULT 0
            );

            CREATE TABLE IF NOT EXISTS orders (
                id INTEGER PRIMARY KEY,
                maker_id INTEGER NOT NULL,
                taker_id INTEGER,
                status TEXT NOT NULL,
                expires_at INTEGER NOT NULL
            );

            CREATE TABLE IF NOT EXISTS ln_payments (
                payment_hash TEXT PRIMARY KEY,
                invoice TEXT NOT NULL,
                num_satoshis INTEGER NOT NULL,
                routing_budget_ppm INTEGER NOT NULL DEFAULT 0,
                status TEXT NOT NULL,
                last_routing_time INTEGER,
                order_made_id INTEGER,
                order_taken_id INTEGER
            );

            CREATE TABLE IF NOT EXISTS onchain_payments (
                id INTEGER PRIMARY KEY,
                num_satoshis INTEGER NOT NULL,
                status TEXT NOT NULL,
                order_paid_id INTEGER
            );

            CREATE TABLE IF NOT EXISTS chat_messages (
                id INTEGER PRIMARY KEY,
                order_id INTEGER NOT NULL,
                sender TEXT NOT NULL,
                text TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS cached_prices (
                currency_id INTEGER PRIMARY KEY,
                code TEXT NOT NULL,
                exchange_rate REAL NOT NULL,
                timestamp INTEGER NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_accounts_login ON accounts(last_login);
            CREATE INDEX IF NOT EXISTS idx_profiles_pending ON profiles(pending_rewards);
            CREATE INDEX IF NOT EXISTS idx_orders_maker ON orders(maker_id);
            CREATE INDEX IF NOT EXISTS idx_orders_taker ON orders(taker_id);
            CREATE INDEX IF NOT EXISTS idx_ln_status ON ln_payments(status);
            CREATE INDEX IF NOT EXISTS idx_onchain_status ON onchain_payments(status);",
        )?;

        Ok(())
    }

    pub fn save_account(&self, account: &Account) -> Result<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO accounts (id, username, is_privileged, last_login)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                account.id,
                account.username,
                account.is_privileged,
                account.last_login.map(|dt| dt.timestamp()),
            ],
        )?;
        Ok(())
    }

    pub fn save_profile(&self, profile: &IncentiveProfile) -> Result<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO profiles
             (account_id, pending_rewards, earned_rewards, claimed_rewards,
              telegram_enabled, telegram_chat_id, total_contracts)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                profile.account_id,
                profile.pending_rewards,
                profile.earned_rewards,
                profile.claimed_rewards,
                profile.telegram_enabled,
                profile.telegram_chat_id,
                profile.total_contracts,
            ],
        )?;
        Ok(())
    }

    pub fn save_order(&self, order: &Order) -> Result<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO orders (id, maker_id, taker_id, status, expires_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                order.id,
                order.maker_id,
                order.taker_id,
                order.status.to_string(),
                order.expires_at.timestamp(),
            ],
        )?;
        Ok(())
    }

    pub fn save_lightning_payment(
        &self,
        payment: &LightningPayment,
        order_made_id: Option<i64>,
        order_taken_id: Option<i64>,
    ) -> Result<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO ln_payments
             (payment_hash, invoice, num_satoshis, routing_budget_ppm, status,
              last_routing_time, order_made_id, order_taken_id)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                payment.payment_hash,
                payment.invoice,
                payment.num_satoshis,
                payment.routing_budget_ppm,
                payment.status.to_string(),
                payment.last_routing_time.map(|dt| dt.timestamp()),
                order_made_id,
                order_taken_id,
            ],
        )?;
        Ok(())
    }

    pub fn save_onchain_payment(&self, payment: &OnchainPayment, order_paid_id: Option<i64>) -> Result<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO onchain_payments (id, num_satoshis, status, order_paid_id)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                payment.id,
                payment.num_satoshis,
                payment.status.to_string(),
                order_paid_id,
            ],
        )?;
        Ok(())
    }

    pub fn save_chat_message(&self, message: &ChatMessage) -> Result<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO chat_messages (id, order_id, sender, text)
             VALUES (?1, ?2, ?3, ?4)",
            params![message.id, message.order_id, message.sender, message.text],
        )?;
        Ok(())
    }

    fn participant(&self, account_id: i64) -> Result<Participant> {
        self.conn
            .query_row(
                "SELECT a.id, a.username, COALESCE(p.telegram_enabled, 0), p.telegram_chat_id
                 FROM accounts a LEFT JOIN profiles p ON p.account_id = a.id
                 WHERE a.id = ?1",
                [account_id],
                |row| {
                    Ok(Participant {
                        account_id: row.get(0)?,
                        username: row.get(1)?,
                        telegram_enabled: row.get(2)?,
                        telegram_chat_id: row.get(3)?,
                    })
                },
            )
            .optional()?
            .ok_or_else(|| MaintenanceError::NotFound(format!("account {}", account_id)))
    }
}

fn timestamp(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<DateTime<Utc>>> {
    row.get::<_, Option<i64>>(idx)?
        .map(|secs| {
            DateTime::from_timestamp(secs, 0).ok_or_else(|| {
                rusqlite::Error::FromSqlConversionFailure(
                    idx,
                    Type::Integer,
                    format!("timestamp out of range: {}", secs).into(),
                )
            })
        })
        .transpose()
}

fn required_timestamp(row: &Row<'_>, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    timestamp(row, idx)?.ok_or(rusqlite::Error::InvalidColumnType(
        idx,
        "timestamp".to_string(),
        Type::Null,
    ))
}

fn parsed<T>(row: &Row<'_>, idx: usize) -> rusqlite::Result<T>
where
    T: std::str::FromStr<Err = String>,
{
    let raw: String = row.get(idx)?;
    raw.parse()
        .map_err(|e: String| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, e.into()))
}

fn lightning_from_row(row: &Row<'_>) -> rusqlite::Result<LightningPayment> {
    Ok(LightningPayment {
        payment_hash: row.get(0)?,
        invoice: row.get(1)?,
        num_satoshis: row.get(2)?,
        routing_budget_ppm: row.get(3)?,
        status: parsed::<PaymentStatus>(row, 4)?,
        last_routing_time: timestamp(row, 5)?,
        order_made_expires_at: timestamp(row, 6)?,
        order_taken_expires_at: timestamp(row, 7)?,
    })
}

fn quoted(statuses: impl IntoIterator<Item = String>) -> String {
    statuses
        .into_iter()
        .map(|s| format!("'{}'", s))
        .collect::<Vec<_>>()
        .join(", ")
}

impl AccountStore for Database {
    fn inactive_accounts(&self, inactive_since: DateTime<Utc>) -> Result<Vec<Account>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, username, is_privileged, last_login
             FROM accounts
             WHERE is_privileged = 0
               AND (last_login IS NULL OR last_login < ?1)
             ORDER BY id",
        )?;

        let accounts = stmt
            .query_map([inactive_since.timestamp()], |row| {
                Ok(Account {
                    id: row.get(0)?,
                    username: row.get(1)?,
                    is_privileged: row.get(2)?,
                    last_login: timestamp(row, 3)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(accounts)
    }

    fn profile(&self, account_id: i64) -> Result<Option<IncentiveProfile>> {
        let profile = self
            .conn
            .query_row(
                "SELECT account_id, pending_rewards, earned_rewards, claimed_rewards,
                        telegram_enabled, telegram_chat_id, total_contracts
                 FROM profiles WHERE account_id = ?1",
                [account_id],
                |row| {
                    Ok(IncentiveProfile {
                        account_id: row.get(0)?,
                        pending_rewards: row.get(1)?,
                        earned_rewards: row.get(2)?,
                        claimed_rewards: row.get(3)?,
                        telegram_enabled: row.get(4)?,
                        telegram_chat_id: row.get(5)?,
                        total_contracts: row.get(6)?,
                    })
                },
            )
            .optional()?;
        Ok(profile)
    }

    fn delete_account(&self, account_id: i64) -> Result<()> {
        let tx = self.conn.unchecked_transaction()?;
        tx.execute("DELETE FROM profiles WHERE account_id = ?1", [account_id])?;
        let deleted = tx.execute("DELETE FROM accounts WHERE id = ?1", [account_id])?;
        if deleted == 0 {
            return Err(MaintenanceError::NotFound(format!("account {}", account_id)));
        }
        tx.commit()?;
        Ok(())
    }
}

impl EngagementOracle for Database {
    fn has_active_engagement(&self, account_id: i64) -> Result<bool> {
        let terminal = quoted(OrderStatus::TERMINAL.iter().map(|s| s.to_string()));
        let query = format!(
            "SELECT EXISTS(
                SELECT 1 FROM orders
                WHERE (maker_id = ?1 OR taker_id = ?1)
                  AND status NOT IN ({})
             )",
            terminal
        );
        let engaged: bool = self.conn.query_row(&query, [account_id], |row| row.get(0))?;
        Ok(engaged)
    }
}

impl RewardStore for Database {
    fn pending_rewards(&self) -> Result<Vec<RewardCandidate>> {
        let mut stmt = self.conn.prepare(
            "SELECT a.username, p.account_id, p.pending_rewards, p.earned_rewards,
                    p.claimed_rewards, p.telegram_enabled, p.telegram_chat_id, p.total_contracts
             FROM profiles p JOIN accounts a ON a.id = p.account_id
             WHERE p.pending_rewards > 0
             ORDER BY p.account_id",
        )?;

        let candidates = stmt
            .query_map([], |row| {
                Ok(RewardCandidate {
                    username: row.get(0)?,
                    profile: IncentiveProfile {
                        account_id: row.get(1)?,
                        pending_rewards: row.get(2)?,
                        earned_rewards: row.get(3)?,
                        claimed_rewards: row.get(4)?,
                        telegram_enabled: row.get(5)?,
                        telegram_chat_id: row.get(6)?,
                        total_contracts: row.get(7)?,
                    },
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(candidates)
    }

    fn promote_pending(&self, account_id: i64, amount: u64) -> Result<Option<u64>> {
        let tx = self.conn.unchecked_transaction()?;
        let updated = tx.execute(
            "UPDATE profiles
             SET earned_rewards = earned_rewards + ?2,
                 pending_rewards = pending_rewards - ?2
             WHERE account_id = ?1 AND pending_rewards >= ?2",
            params![account_id, amount],
        )?;
        if updated == 0 {
            return Ok(None);
        }
        let earned: u64 = tx.query_row(
            "SELECT earned_rewards FROM profiles WHERE account_id = ?1",
            [account_id],
            |row| row.get(0),
        )?;
        tx.commit()?;
        Ok(Some(earned))
    }
}

impl PaymentStore for Database {
    fn stale_lightning_payments(&self, expired_before: DateTime<Utc>) -> Result<Vec<LightningPayment>> {
        let query = format!(
            "SELECT {} {}
             WHERE p.status = ?1
               AND (om.expires_at < ?2 OR ot.expires_at < ?2)
             ORDER BY p.payment_hash",
            LIGHTNING_COLUMNS, LIGHTNING_JOINS
        );
        let mut stmt = self.conn.prepare(&query)?;

        let payments = stmt
            .query_map(
                params![PaymentStatus::Cancelled.to_string(), expired_before.timestamp()],
                lightning_from_row,
            )?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(payments)
    }

    fn stale_onchain_payments(&self, expired_before: DateTime<Utc>) -> Result<Vec<OnchainPayment>> {
        let reclaimable = quoted(OnchainStatus::RECLAIMABLE.iter().map(|s| s.to_string()));
        let query = format!(
            "SELECT p.id, p.num_satoshis, p.status, o.expires_at
             FROM onchain_payments p LEFT JOIN orders o ON o.id = p.order_paid_id
             WHERE p.status IN ({})
               AND (o.expires_at < ?1 OR o.id IS NULL)
             ORDER BY p.id",
            reclaimable
        );
        let mut stmt = self.conn.prepare(&query)?;

        let payments = stmt
            .query_map([expired_before.timestamp()], |row| {
                Ok(OnchainPayment {
                    id: row.get(0)?,
                    num_satoshis: row.get(1)?,
                    status: parsed::<OnchainStatus>(row, 2)?,
                    order_expires_at: timestamp(row, 3)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(payments)
    }

    fn delete_lightning_payment(&self, payment_hash: &str) -> Result<()> {
        let deleted = self
            .conn
            .execute("DELETE FROM ln_payments WHERE payment_hash = ?1", [payment_hash])?;
        if deleted == 0 {
            return Err(MaintenanceError::NotFound(format!("lightning payment {}", payment_hash)));
        }
        Ok(())
    }

    fn delete_onchain_payment(&self, id: i64) -> Result<()> {
        let deleted = self.conn.execute("DELETE FROM onchain_payments WHERE id = ?1", [id])?;
        if deleted == 0 {
            return Err(MaintenanceError::NotFound(format!("onchain payment {}", id)));
        }
        Ok(())
    }

    fn lightning_payment(&self, payment_hash: &str) -> Result<Option<LightningPayment>> {
        let query = format!(
            "SELECT {} {} WHERE p.payment_hash = ?1",
            LIGHTNING_COLUMNS, LIGHTNING_JOINS
        );
        let payment = self
            .conn
            .query_row(&query, [payment_hash], lightning_from_row)
            .optional()?;
        Ok(payment)
    }

    fn stamp_routing_attempt(&self, payment_hash: &str, at: DateTime<Utc>) -> Result<()> {
        let updated = self.conn.execute(
            "UPDATE ln_payments SET last_routing_time = ?1 WHERE payment_hash = ?2",
            params![at.timestamp(), payment_hash],
        )?;
        if updated == 0 {
            return Err(MaintenanceError::NotFound(format!("lightning payment {}", payment_hash)));
        }
        Ok(())
    }
}

impl OrderStore for Database {
    fn order_context(&self, order_id: i64) -> Result<Option<OrderContext>> {
        let order = self
            .conn
            .query_row(
                "SELECT id, maker_id, taker_id, status, expires_at FROM orders WHERE id = ?1",
                [order_id],
                |row| {
                    Ok(Order {
                        id: row.get(0)?,
                        maker_id: row.get(1)?,
                        taker_id: row.get(2)?,
                        status: parsed::<OrderStatus>(row, 3)?,
                        expires_at: required_timestamp(row, 4)?,
                    })
                },
            )
            .optional()?;

        let Some(order) = order else {
            return Ok(None);
        };

        let maker = self.participant(order.maker_id)?;
        let taker = order.taker_id.map(|id| self.participant(id)).transpose()?;

        Ok(Some(OrderContext { order, maker, taker }))
    }

    fn chat_message(&self, message_id: i64) -> Result<Option<ChatMessage>> {
        let message = self
            .conn
            .query_row(
                "SELECT id, order_id, sender, text FROM chat_messages WHERE id = ?1",
                [message_id],
                |row| {
                    Ok(ChatMessage {
                        id: row.get(0)?,
                        order_id: row.get(1)?,
                        sender: row.get(2)?,
                        text: row.get(3)?,
                    })
                },
            )
            .optional()?;
        Ok(message)
    }
}

impl PriceStore for Database {
    fn upsert_price(&self, price: &CachedPrice) -> Result<()> {
        self.conn.execute(
            "INSERT INTO cached_prices (currency_id, code, exchange_rate, timestamp)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(currency_id) DO UPDATE SET
                exchange_rate = excluded.exchange_rate,
                timestamp = excluded.timestamp",
            params![
                price.currency_id,
                price.code,
                price.exchange_rate,
                price.timestamp.timestamp(),
            ],
        )?;
        Ok(())
    }
}
