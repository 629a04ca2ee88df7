use std::collections::HashMap;

use bigdecimal::{BigDecimal, Zero};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use tracing::{info, warn};
use uuid::Uuid;

use crate::db;
use crate::errors::AppError;
use crate::models::{Account, AccountType, DailyPrice, Debt, Investment, NetWorthBreakdown, PhysicalAsset};

/// Everything a user owns or owes that feeds the net worth calculation.
#[derive(Debug, Clone, Default)]
pub struct UserHoldings {
    pub accounts: Vec<Account>,
    pub investments: Vec<Investment>,
    pub physical_assets: Vec<PhysicalAsset>,
    pub debts: Vec<Debt>,
}

/// What to do when a held symbol has no usable price at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingPricePolicy {
    #[default]
    Abort,
    SubstituteZero,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PriceBasis {
    Feed,
    CachedFallback,
    StaleFeed,
    Placeholder,
    Missing,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PositionValuation {
    pub symbol: String,
    pub shares: BigDecimal,
    pub price: BigDecimal,
    pub basis: PriceBasis,
    pub value: BigDecimal,
}

/// Latest price rows per symbol plus the staleness rule used to pick between them.
#[derive(Debug, Clone)]
pub struct PriceBook {
    latest: HashMap<String, Vec<DailyPrice>>,
    as_of: NaiveDate,
    stale_after_days: i64,
}

impl PriceBook {
    pub fn new(latest: HashMap<String, Vec<DailyPrice>>, as_of: NaiveDate, stale_after_days: i64) -> Self {
        Self { latest, as_of, stale_after_days }
    }

    pub fn empty(as_of: NaiveDate) -> Self {
        Self::new(HashMap::new(), as_of, 5)
    }

    fn latest_where(&self, symbol: &str, authoritative: bool) -> Option<&DailyPrice> {
        self.latest
            .get(symbol)?
            .iter()
            .filter(|p| p.is_authoritative() == authoritative)
            .max_by_key(|p| p.date)
    }

    /// Resolve the price used to value a position.
    ///
    /// Order: fresh feed price, cached last-known price, stale feed price, placeholder row.
    pub fn resolve(&self, investment: &Investment) -> Option<(BigDecimal, PriceBasis)> {
        let feed = self.latest_where(&investment.symbol, true);

        if let Some(p) = feed {
            if (self.as_of - p.date).num_days() <= self.stale_after_days {
                return Some((p.close.clone(), PriceBasis::Feed));
            }
        }

        if let Some(cached) = investment.last_known_price.as_ref().filter(|p| **p > BigDecimal::zero()) {
            return Some((cached.clone(), PriceBasis::CachedFallback));
        }

        if let Some(p) = feed {
            return Some((p.close.clone(), PriceBasis::StaleFeed));
        }

        self.latest_where(&investment.symbol, false)
            .map(|p| (p.close.clone(), PriceBasis::Placeholder))
    }
}

fn sum<'a>(values: impl Iterator<Item = &'a BigDecimal>) -> BigDecimal {
    values.fold(BigDecimal::zero(), |acc, v| acc + v)
}

/// Balances of active checking and savings accounts.
pub fn liquid_assets(accounts: &[Account]) -> BigDecimal {
    sum(accounts
        .iter()
        .filter(|a| a.is_active && a.kind().map(|k| k.is_liquid()).unwrap_or(false))
        .map(|a| &a.balance))
}

/// Negative balances on active credit accounts, as a positive amount owed.
pub fn credit_liabilities(accounts: &[Account]) -> BigDecimal {
    accounts
        .iter()
        .filter(|a| a.is_active && a.kind() == Some(AccountType::Credit) && a.balance < BigDecimal::zero())
        .fold(BigDecimal::zero(), |acc, a| acc - &a.balance)
}

/// Equity of active physical assets. Asset loans are already netted out of equity.
pub fn physical_equity(assets: &[PhysicalAsset]) -> BigDecimal {
    sum(assets.iter().filter(|a| a.is_active).map(|a| &a.equity))
}

/// Remaining balances of active debts that are not paid off.
pub fn debt_liabilities(debts: &[Debt]) -> BigDecimal {
    sum(debts.iter().filter_map(|d| d.outstanding()))
}

pub fn value_positions(
    investments: &[Investment],
    prices: &PriceBook,
    policy: MissingPricePolicy,
) -> Result<Vec<PositionValuation>, AppError> {
    let mut positions = Vec::new();

    for inv in investments.iter().filter(|i| i.is_active) {
        let (price, basis) = match prices.resolve(inv) {
            Some(resolved) => resolved,
            None if policy == MissingPricePolicy::SubstituteZero => {
                warn!("No price data for {}; valuing position at zero", inv.symbol);
                (BigDecimal::zero(), PriceBasis::Missing)
            }
            None => {
                return Err(AppError::DataUnavailable(format!(
                    "No price data for held symbol {}",
                    inv.symbol
                )));
            }
        };

        if matches!(basis, PriceBasis::StaleFeed | PriceBasis::Placeholder) {
            warn!("Valuing {} with {:?} price {}", inv.symbol, basis, price);
        }

        positions.push(PositionValuation {
            symbol: inv.symbol.clone(),
            shares: inv.shares.clone(),
            value: &inv.shares * &price,
            price,
            basis,
        });
    }

    Ok(positions)
}

pub fn portfolio_value(
    investments: &[Investment],
    prices: &PriceBook,
    policy: MissingPricePolicy,
) -> Result<BigDecimal, AppError> {
    let positions = value_positions(investments, prices, policy)?;
    Ok(sum(positions.iter().map(|p| &p.value)))
}

/// Pure net worth computation over already-loaded holdings. No side effects.
pub fn compute_breakdown(
    holdings: &UserHoldings,
    prices: &PriceBook,
    policy: MissingPricePolicy,
) -> Result<NetWorthBreakdown, AppError> {
    let liquid = liquid_assets(&holdings.accounts);
    let portfolio = portfolio_value(&holdings.investments, prices, policy)?;
    let physical = physical_equity(&holdings.physical_assets);
    let liabilities = debt_liabilities(&holdings.debts) + credit_liabilities(&holdings.accounts);

    Ok(NetWorthBreakdown::from_components(liquid, portfolio, physical, liabilities))
}

pub async fn load_holdings(pool: &PgPool, user_id: Uuid) -> Result<UserHoldings, AppError> {
    let (accounts, investments, physical_assets, debts) = tokio::try_join!(
        db::account_queries::fetch_active_for_user(pool, user_id),
        db::investment_queries::fetch_active_for_user(pool, user_id),
        db::physical_asset_queries::fetch_active_for_user(pool, user_id),
        db::debt_queries::fetch_active_for_user(pool, user_id),
    )?;

    Ok(UserHoldings {
        accounts,
        investments,
        physical_assets,
        debts,
    })
}

pub async fn load_price_book(
    pool: &PgPool,
    investments: &[Investment],
    as_of: NaiveDate,
    stale_after_days: i64,
) -> Result<PriceBook, AppError> {
    let mut symbols: Vec<String> = investments.iter().map(|i| i.symbol.clone()).collect();
    symbols.sort();
    symbols.dedup();

    let latest = db::price_queries::fetch_latest_batch(pool, &symbols).await?;
    Ok(PriceBook::new(latest, as_of, stale_after_days))
}

/// Load a user's holdings and prices and compute their net worth breakdown.
pub async fn compute_net_worth(
    pool: &PgPool,
    user_id: Uuid,
    stale_after_days: i64,
    policy: MissingPricePolicy,
) -> Result<NetWorthBreakdown, AppError> {
    let holdings = load_holdings(pool, user_id).await?;
    let today = chrono::Utc::now().date_naive();
    let prices = load_price_book(pool, &holdings.investments, today, stale_after_days).await?;

    let breakdown = compute_breakdown(&holdings, &prices, policy)?;
    info!(
        "Net worth for user {}: {} (liquid {}, portfolio {}, physical {}, liabilities {})",
        user_id,
        breakdown.net_worth,
        breakdown.liquid_assets,
        breakdown.portfolio_value,
        breakdown.physical_assets,
        breakdown.total_liabilities
    );
    Ok(breakdown)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CreateAccount, CreateDebt, CreateInvestment, CreatePhysicalAsset, LoanInfo, PriceSource};
    use chrono::{Duration, Utc};

    fn dec(s: &str) -> BigDecimal {
        s.parse().unwrap()
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 16).unwrap()
    }

    fn account(account_type: AccountType, balance: &str) -> Account {
        Account::new(
            Uuid::new_v4(),
            CreateAccount {
                name: format!("{} account", account_type),
                account_type,
                balance: dec(balance),
                currency: None,
            },
        )
    }

    fn investment(symbol: &str, shares: &str, cached: Option<&str>) -> Investment {
        Investment::new(
            Uuid::new_v4(),
            CreateInvestment {
                symbol: symbol.to_string(),
                shares: dec(shares),
                last_known_price: cached.map(dec),
            },
        )
    }

    fn price(symbol: &str, date: NaiveDate, close: &str, source: PriceSource) -> DailyPrice {
        DailyPrice {
            id: Uuid::new_v4(),
            symbol: symbol.to_string(),
            date,
            open: dec(close),
            high: dec(close),
            low: dec(close),
            close: dec(close),
            volume: 0,
            source: source.as_str().to_string(),
            created_at: Utc::now(),
        }
    }

    fn book(rows: Vec<DailyPrice>) -> PriceBook {
        let mut latest: HashMap<String, Vec<DailyPrice>> = HashMap::new();
        for row in rows {
            latest.entry(row.symbol.clone()).or_default().push(row);
        }
        PriceBook::new(latest, today(), 5)
    }

    #[test]
    fn test_empty_holdings_yield_zero_net_worth() {
        let b = compute_breakdown(&UserHoldings::default(), &PriceBook::empty(today()), MissingPricePolicy::Abort)
            .unwrap();
        assert_eq!(b, NetWorthBreakdown::zero());
        assert!(b.net_worth.is_zero());
    }

    #[test]
    fn test_liquid_assets_only_count_active_checking_and_savings() {
        let mut closed = account(AccountType::Savings, "999");
        closed.is_active = false;
        let accounts = vec![
            account(AccountType::Checking, "1000"),
            account(AccountType::Savings, "2500.50"),
            account(AccountType::Retirement, "40000"),
            account(AccountType::Investment, "7000"),
            account(AccountType::Credit, "-300"),
            closed,
        ];
        assert_eq!(liquid_assets(&accounts), dec("3500.50"));
        assert_eq!(credit_liabilities(&accounts), dec("300"));
    }

    #[test]
    fn test_positive_credit_balance_is_not_a_liability() {
        let accounts = vec![account(AccountType::Credit, "25")];
        assert!(credit_liabilities(&accounts).is_zero());
    }

    #[test]
    fn test_fresh_feed_price_wins_over_cache_and_placeholder() {
        let inv = investment("VTI", "10", Some("180"));
        let prices = book(vec![
            price("VTI", today() - Duration::days(1), "200", PriceSource::YahooFinance),
            price("VTI", today(), "150", PriceSource::Manual),
        ]);
        assert_eq!(prices.resolve(&inv), Some((dec("200"), PriceBasis::Feed)));
    }

    #[test]
    fn test_stale_feed_falls_back_to_cached_price() {
        let inv = investment("VTI", "10", Some("180"));
        let prices = book(vec![price("VTI", today() - Duration::days(30), "120", PriceSource::YahooFinance)]);
        assert_eq!(prices.resolve(&inv), Some((dec("180"), PriceBasis::CachedFallback)));

        let uncached = investment("VTI", "10", None);
        assert_eq!(prices.resolve(&uncached), Some((dec("120"), PriceBasis::StaleFeed)));
    }

    #[test]
    fn test_placeholder_used_only_without_feed_or_cache() {
        let inv = investment("XYZ", "3", None);
        let prices = book(vec![price("XYZ", today(), "9.5", PriceSource::Manual)]);
        assert_eq!(prices.resolve(&inv), Some((dec("9.5"), PriceBasis::Placeholder)));
    }

    #[test]
    fn test_missing_price_is_data_unavailable_unless_substituted() {
        let holdings = UserHoldings {
            investments: vec![investment("NOPE", "5", None)],
            ..Default::default()
        };
        let prices = PriceBook::empty(today());

        let err = compute_breakdown(&holdings, &prices, MissingPricePolicy::Abort).unwrap_err();
        assert!(matches!(err, AppError::DataUnavailable(_)));

        let b = compute_breakdown(&holdings, &prices, MissingPricePolicy::SubstituteZero).unwrap();
        assert!(b.portfolio_value.is_zero());
    }

    #[test]
    fn test_full_breakdown() {
        let mut paid = Debt::new(
            Uuid::new_v4(),
            CreateDebt {
                name: "Old card".to_string(),
                total_amount: dec("500"),
                remaining_balance: dec("0"),
                interest_rate: None,
                minimum_payment: None,
            },
        );
        paid.normalize(Utc::now());

        let holdings = UserHoldings {
            accounts: vec![
                account(AccountType::Checking, "1500"),
                account(AccountType::Savings, "8500"),
                account(AccountType::Credit, "-700"),
            ],
            investments: vec![investment("VTI", "10.5", None)],
            physical_assets: vec![PhysicalAsset::new(
                Uuid::new_v4(),
                CreatePhysicalAsset {
                    name: "Car".to_string(),
                    current_value: dec("20000"),
                    loan: Some(LoanInfo {
                        balance: dec("12000"),
                        lender: None,
                        rate: None,
                    }),
                },
            )],
            debts: vec![
                Debt::new(
                    Uuid::new_v4(),
                    CreateDebt {
                        name: "Student loan".to_string(),
                        total_amount: dec("30000"),
                        remaining_balance: dec("18000"),
                        interest_rate: None,
                        minimum_payment: None,
                    },
                ),
                paid,
            ],
        };
        let prices = book(vec![price("VTI", today(), "200", PriceSource::YahooFinance)]);

        let b = compute_breakdown(&holdings, &prices, MissingPricePolicy::Abort).unwrap();
        assert_eq!(b.liquid_assets, dec("10000"));
        assert_eq!(b.portfolio_value, dec("2100"));
        assert_eq!(b.physical_assets, dec("8000"));
        assert_eq!(b.total_liabilities, dec("18700"));
        assert_eq!(b.net_worth, dec("1400"));
    }
}
