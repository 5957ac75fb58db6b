//! Ledger repository implementation
//!
//! Database access for accounts, journal vouchers and posted-line queries.
//! Every function runs on the caller's connection so that it takes part in
//! the caller's transaction.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::{FromRow, PgConnection};
use std::collections::HashMap;
use uuid::Uuid;

use core_kernel::{DateWindow, Period, TenantId, VoucherId};
use domain_ledger::{
    Account, AccountClass, AccountTotals, JournalVoucher, JournalVoucherLine, LedgerEntry,
    NewVoucher, NewVoucherLine, SystemRole, VoucherSource, VoucherStatus,
};

use crate::error::DatabaseError;

/// Account class enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "account_class", rename_all = "snake_case")]
pub enum DbAccountClass {
    Asset,
    Liability,
    Equity,
    Revenue,
    Expense,
    CostOfGoodsSold,
}

impl From<AccountClass> for DbAccountClass {
    fn from(class: AccountClass) -> Self {
        match class {
            AccountClass::Asset => DbAccountClass::Asset,
            AccountClass::Liability => DbAccountClass::Liability,
            AccountClass::Equity => DbAccountClass::Equity,
            AccountClass::Revenue => DbAccountClass::Revenue,
            AccountClass::Expense => DbAccountClass::Expense,
            AccountClass::CostOfGoodsSold => DbAccountClass::CostOfGoodsSold,
        }
    }
}

impl From<DbAccountClass> for AccountClass {
    fn from(class: DbAccountClass) -> Self {
        match class {
            DbAccountClass::Asset => AccountClass::Asset,
            DbAccountClass::Liability => AccountClass::Liability,
            DbAccountClass::Equity => AccountClass::Equity,
            DbAccountClass::Revenue => AccountClass::Revenue,
            DbAccountClass::Expense => AccountClass::Expense,
            DbAccountClass::CostOfGoodsSold => AccountClass::CostOfGoodsSold,
        }
    }
}

/// Voucher status enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "voucher_status", rename_all = "snake_case")]
pub enum DbVoucherStatus {
    Draft,
    Posted,
}

impl From<VoucherStatus> for DbVoucherStatus {
    fn from(status: VoucherStatus) -> Self {
        match status {
            VoucherStatus::Draft => DbVoucherStatus::Draft,
            VoucherStatus::Posted => DbVoucherStatus::Posted,
        }
    }
}

impl From<DbVoucherStatus> for VoucherStatus {
    fn from(status: DbVoucherStatus) -> Self {
        match status {
            DbVoucherStatus::Draft => VoucherStatus::Draft,
            DbVoucherStatus::Posted => VoucherStatus::Posted,
        }
    }
}

/// Account row from the database
#[derive(Debug, Clone, FromRow)]
pub struct AccountRow {
    pub tenant_id: Uuid,
    pub code: String,
    pub name: String,
    pub class: DbAccountClass,
    pub system_role: Option<String>,
    pub description: Option<String>,
    pub is_active: bool,
}

impl TryFrom<AccountRow> for Account {
    type Error = DatabaseError;

    fn try_from(row: AccountRow) -> Result<Self, Self::Error> {
        let system_role = row
            .system_role
            .as_deref()
            .map(|role| {
                role.parse::<SystemRole>()
                    .map_err(|_| DatabaseError::mapping("accounts.system_role", role))
            })
            .transpose()?;

        Ok(Account {
            tenant_id: TenantId::from_uuid(row.tenant_id),
            code: row.code,
            name: row.name,
            class: row.class.into(),
            system_role,
            description: row.description,
            is_active: row.is_active,
        })
    }
}

/// Voucher header row from the database
#[derive(Debug, Clone, FromRow)]
pub struct VoucherRow {
    pub id: i64,
    pub tenant_id: Uuid,
    pub voucher_number: String,
    pub source: String,
    pub reference_id: Option<String>,
    pub narration: String,
    pub entry_date: NaiveDate,
    pub status: DbVoucherStatus,
    pub total_debit: Decimal,
    pub total_credit: Decimal,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
}

/// Voucher line row from the database
#[derive(Debug, Clone, FromRow)]
pub struct VoucherLineRow {
    pub line_no: i32,
    pub account_code: String,
    pub debit: Decimal,
    pub credit: Decimal,
    pub description: Option<String>,
    pub payee_ref: Option<String>,
}

impl From<VoucherLineRow> for JournalVoucherLine {
    fn from(row: VoucherLineRow) -> Self {
        JournalVoucherLine {
            line_no: row.line_no,
            account_code: row.account_code,
            debit: row.debit,
            credit: row.credit,
            description: row.description,
            payee_ref: row.payee_ref,
        }
    }
}

/// Posted line joined with its voucher header
#[derive(Debug, Clone, FromRow)]
pub struct LedgerEntryRow {
    pub voucher_id: i64,
    pub voucher_number: String,
    pub line_no: i32,
    pub entry_date: NaiveDate,
    pub reference_id: Option<String>,
    pub description: Option<String>,
    pub debit: Decimal,
    pub credit: Decimal,
}

impl From<LedgerEntryRow> for LedgerEntry {
    fn from(row: LedgerEntryRow) -> Self {
        LedgerEntry {
            voucher_id: VoucherId::new(row.voucher_id),
            voucher_number: row.voucher_number,
            line_no: row.line_no,
            entry_date: row.entry_date,
            reference_id: row.reference_id,
            description: row.description,
            debit: row.debit,
            credit: row.credit,
        }
    }
}

/// Per-account sums of posted lines
#[derive(Debug, Clone, FromRow)]
pub struct TotalsRow {
    pub account_code: String,
    pub debit: Decimal,
    pub credit: Decimal,
}

const ACCOUNT_COLUMNS: &str =
    "tenant_id, code, name, class, system_role, description, is_active";

// Posted lines of a tenant inside a date window: $1 tenant, $2 lower bound
// (nullable), $3 upper limit, $4 whether the upper limit is inclusive
const POSTED_WINDOW_FILTER: &str = r#"
    v.tenant_id = $1
    AND v.status = 'posted'
    AND ($2::date IS NULL OR v.entry_date >= $2)
    AND (CASE WHEN $4 THEN v.entry_date <= $3 ELSE v.entry_date < $3 END)
"#;

/// Repository for the chart of accounts and journal vouchers
#[derive(Debug, Clone, Copy, Default)]
pub struct LedgerRepository;

impl LedgerRepository {
    /// Finds an account by code
    pub async fn find_account(
        conn: &mut PgConnection,
        tenant_id: TenantId,
        code: &str,
    ) -> Result<Option<Account>, DatabaseError> {
        let sql = format!(
            "SELECT {} FROM accounts WHERE tenant_id = $1 AND code = $2",
            ACCOUNT_COLUMNS
        );
        sqlx::query_as::<_, AccountRow>(&sql)
            .bind(tenant_id.as_uuid())
            .bind(code)
            .fetch_optional(conn)
            .await?
            .map(Account::try_from)
            .transpose()
    }

    /// Finds the active account carrying a role
    pub async fn find_account_by_role(
        conn: &mut PgConnection,
        tenant_id: TenantId,
        role: SystemRole,
    ) -> Result<Option<Account>, DatabaseError> {
        let sql = format!(
            "SELECT {} FROM accounts WHERE tenant_id = $1 AND system_role = $2 AND is_active",
            ACCOUNT_COLUMNS
        );
        sqlx::query_as::<_, AccountRow>(&sql)
            .bind(tenant_id.as_uuid())
            .bind(role.as_str())
            .fetch_optional(conn)
            .await?
            .map(Account::try_from)
            .transpose()
    }

    /// Lists a tenant's accounts ordered by code
    pub async fn list_accounts(
        conn: &mut PgConnection,
        tenant_id: TenantId,
    ) -> Result<Vec<Account>, DatabaseError> {
        let sql = format!(
            "SELECT {} FROM accounts WHERE tenant_id = $1 ORDER BY code",
            ACCOUNT_COLUMNS
        );
        sqlx::query_as::<_, AccountRow>(&sql)
            .bind(tenant_id.as_uuid())
            .fetch_all(conn)
            .await?
            .into_iter()
            .map(Account::try_from)
            .collect()
    }

    /// Inserts an account
    pub async fn insert_account(
        conn: &mut PgConnection,
        account: &Account,
    ) -> Result<(), DatabaseError> {
        sqlx::query(
            r#"
            INSERT INTO accounts (tenant_id, code, name, class, system_role, description, is_active)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(account.tenant_id.as_uuid())
        .bind(&account.code)
        .bind(&account.name)
        .bind(DbAccountClass::from(account.class))
        .bind(account.system_role.map(|role| role.as_str()))
        .bind(&account.description)
        .bind(account.is_active)
        .execute(conn)
        .await?;
        Ok(())
    }

    /// Inserts a voucher header and returns the generated id
    pub async fn insert_voucher_header(
        conn: &mut PgConnection,
        header: &NewVoucher,
    ) -> Result<VoucherId, DatabaseError> {
        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO journal_vouchers (
                tenant_id, voucher_number, source, reference_id, narration,
                entry_date, status, total_debit, total_credit, created_by
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING id
            "#,
        )
        .bind(header.tenant_id.as_uuid())
        .bind(&header.voucher_number)
        .bind(header.source.as_str())
        .bind(&header.reference_id)
        .bind(&header.narration)
        .bind(header.entry_date)
        .bind(DbVoucherStatus::from(header.status))
        .bind(header.total_debit)
        .bind(header.total_credit)
        .bind(&header.created_by)
        .fetch_one(conn)
        .await?;

        Ok(VoucherId::new(id))
    }

    /// Inserts one voucher line; the tenant is copied from the header
    pub async fn insert_voucher_line(
        conn: &mut PgConnection,
        voucher_id: VoucherId,
        line: &NewVoucherLine,
    ) -> Result<(), DatabaseError> {
        sqlx::query(
            r#"
            INSERT INTO journal_voucher_lines (
                voucher_id, line_no, tenant_id, account_code, debit, credit, description, payee_ref
            )
            SELECT $1, $2, v.tenant_id, $3, $4, $5, $6, $7
            FROM journal_vouchers v
            WHERE v.id = $1
            "#,
        )
        .bind(voucher_id.value())
        .bind(line.line_no)
        .bind(&line.account_code)
        .bind(line.debit)
        .bind(line.credit)
        .bind(&line.description)
        .bind(&line.payee_ref)
        .execute(conn)
        .await?;
        Ok(())
    }

    /// Replaces the placeholder voucher number
    pub async fn assign_voucher_number(
        conn: &mut PgConnection,
        voucher_id: VoucherId,
        voucher_number: &str,
    ) -> Result<(), DatabaseError> {
        let result = sqlx::query("UPDATE journal_vouchers SET voucher_number = $2 WHERE id = $1")
            .bind(voucher_id.value())
            .bind(voucher_number)
            .execute(conn)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DatabaseError::not_found("JournalVoucher", voucher_id));
        }
        Ok(())
    }

    /// Loads a voucher with its lines
    pub async fn find_voucher(
        conn: &mut PgConnection,
        tenant_id: TenantId,
        voucher_id: VoucherId,
    ) -> Result<Option<JournalVoucher>, DatabaseError> {
        let header = sqlx::query_as::<_, VoucherRow>(
            r#"
            SELECT id, tenant_id, voucher_number, source, reference_id, narration,
                   entry_date, status, total_debit, total_credit, created_by, created_at
            FROM journal_vouchers
            WHERE tenant_id = $1 AND id = $2
            "#,
        )
        .bind(tenant_id.as_uuid())
        .bind(voucher_id.value())
        .fetch_optional(&mut *conn)
        .await?;

        let Some(header) = header else {
            return Ok(None);
        };

        let lines = sqlx::query_as::<_, VoucherLineRow>(
            r#"
            SELECT line_no, account_code, debit, credit, description, payee_ref
            FROM journal_voucher_lines
            WHERE voucher_id = $1
            ORDER BY line_no
            "#,
        )
        .bind(header.id)
        .fetch_all(&mut *conn)
        .await?;

        let source = header
            .source
            .parse::<VoucherSource>()
            .map_err(|_| DatabaseError::mapping("journal_vouchers.source", &header.source))?;

        Ok(Some(JournalVoucher {
            id: VoucherId::new(header.id),
            tenant_id: TenantId::from_uuid(header.tenant_id),
            voucher_number: header.voucher_number,
            source,
            reference_id: header.reference_id,
            narration: header.narration,
            entry_date: header.entry_date,
            status: header.status.into(),
            total_debit: header.total_debit,
            total_credit: header.total_credit,
            created_by: header.created_by,
            created_at: header.created_at,
            lines: lines.into_iter().map(JournalVoucherLine::from).collect(),
        }))
    }

    /// Sums posted lines of one account inside a window
    pub async fn posted_totals(
        conn: &mut PgConnection,
        tenant_id: TenantId,
        account_code: &str,
        window: DateWindow,
    ) -> Result<AccountTotals, DatabaseError> {
        let (upper, inclusive) = window.upper_limit();
        let sql = format!(
            r#"
            SELECT l.account_code,
                   COALESCE(SUM(l.debit), 0) AS debit,
                   COALESCE(SUM(l.credit), 0) AS credit
            FROM journal_voucher_lines l
            JOIN journal_vouchers v ON v.id = l.voucher_id
            WHERE {} AND l.account_code = $5
            GROUP BY l.account_code
            "#,
            POSTED_WINDOW_FILTER
        );

        let row = sqlx::query_as::<_, TotalsRow>(&sql)
            .bind(tenant_id.as_uuid())
            .bind(window.lower_bound())
            .bind(upper)
            .bind(inclusive)
            .bind(account_code)
            .fetch_optional(conn)
            .await?;

        Ok(row
            .map(|r| AccountTotals::new(r.debit, r.credit))
            .unwrap_or_default())
    }

    /// Posted lines of one account in a period, in replay order
    pub async fn posted_entries(
        conn: &mut PgConnection,
        tenant_id: TenantId,
        account_code: &str,
        period: Period,
    ) -> Result<Vec<LedgerEntry>, DatabaseError> {
        let rows = sqlx::query_as::<_, LedgerEntryRow>(
            r#"
            SELECT v.id AS voucher_id, v.voucher_number, l.line_no, v.entry_date,
                   v.reference_id, COALESCE(l.description, v.narration) AS description,
                   l.debit, l.credit
            FROM journal_voucher_lines l
            JOIN journal_vouchers v ON v.id = l.voucher_id
            WHERE v.tenant_id = $1
              AND v.status = 'posted'
              AND l.account_code = $2
              AND v.entry_date BETWEEN $3 AND $4
            ORDER BY v.entry_date, v.id, l.line_no
            "#,
        )
        .bind(tenant_id.as_uuid())
        .bind(account_code)
        .bind(period.from())
        .bind(period.to())
        .fetch_all(conn)
        .await?;

        Ok(rows.into_iter().map(LedgerEntry::from).collect())
    }

    /// Sums posted lines per account inside a window
    pub async fn posted_totals_by_account(
        conn: &mut PgConnection,
        tenant_id: TenantId,
        window: DateWindow,
    ) -> Result<HashMap<String, AccountTotals>, DatabaseError> {
        let (upper, inclusive) = window.upper_limit();
        let sql = format!(
            r#"
            SELECT l.account_code,
                   COALESCE(SUM(l.debit), 0) AS debit,
                   COALESCE(SUM(l.credit), 0) AS credit
            FROM journal_voucher_lines l
            JOIN journal_vouchers v ON v.id = l.voucher_id
            WHERE {}
            GROUP BY l.account_code
            "#,
            POSTED_WINDOW_FILTER
        );

        let rows = sqlx::query_as::<_, TotalsRow>(&sql)
            .bind(tenant_id.as_uuid())
            .bind(window.lower_bound())
            .bind(upper)
            .bind(inclusive)
            .fetch_all(conn)
            .await?;

        Ok(rows
            .into_iter()
            .map(|r| (r.account_code, AccountTotals::new(r.debit, r.credit)))
            .collect())
    }
}
