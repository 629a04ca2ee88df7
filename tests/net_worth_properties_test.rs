//! Property-based tests for the net worth and goal invariants.
//!
//! Every property runs against the pure functions only; no database is needed.

use std::collections::HashMap;

use bigdecimal::{BigDecimal, Zero};
use chrono::{NaiveDate, Utc};
use proptest::prelude::*;
use uuid::Uuid;

use wealthwise_backend::models::{
    Account, AccountType, CreateAccount, CreateDebt, CreateGoal, CreateInvestment, CreatePhysicalAsset, Debt, Goal,
    Investment, LoanInfo, MilestoneTrigger, NetWorthMilestone, PhysicalAsset,
};
use wealthwise_backend::services::allocation_service::{allocation_cap, apply_allocation, select_allocation};
use wealthwise_backend::services::valuation_service::{
    compute_breakdown, MissingPricePolicy, PriceBook, UserHoldings,
};

// =============================================================================
// Generators
// =============================================================================

fn cents(c: i64) -> BigDecimal {
    BigDecimal::from(c) / BigDecimal::from(100)
}

/// Non-negative money amount with two decimal places.
fn arb_money() -> impl Strategy<Value = BigDecimal> {
    (0i64..50_000_000).prop_map(cents)
}

/// Signed money amount, used where negative inputs must be tolerated.
fn arb_signed_money() -> impl Strategy<Value = BigDecimal> {
    (-5_000_000i64..5_000_000).prop_map(cents)
}

fn arb_account_type() -> impl Strategy<Value = AccountType> {
    prop_oneof![
        Just(AccountType::Checking),
        Just(AccountType::Savings),
        Just(AccountType::Investment),
        Just(AccountType::Retirement),
        Just(AccountType::Credit),
        Just(AccountType::Loan),
    ]
}

fn arb_account(user: Uuid) -> impl Strategy<Value = Account> {
    (arb_account_type(), arb_signed_money(), any::<bool>()).prop_map(move |(account_type, balance, active)| {
        let mut a = Account::new(
            user,
            CreateAccount {
                name: "Generated".to_string(),
                account_type,
                balance,
                currency: None,
            },
        );
        a.is_active = active;
        a
    })
}

fn arb_investment(user: Uuid) -> impl Strategy<Value = Investment> {
    // shares with up to four decimals, cached prices with up to four decimals
    (0i64..10_000_000, 1i64..100_000_000).prop_map(move |(shares, price)| {
        Investment::new(
            user,
            CreateInvestment {
                symbol: "GEN".to_string(),
                shares: BigDecimal::from(shares) / BigDecimal::from(10_000),
                last_known_price: Some(BigDecimal::from(price) / BigDecimal::from(10_000)),
            },
        )
    })
}

fn arb_asset(user: Uuid) -> impl Strategy<Value = PhysicalAsset> {
    (arb_money(), proptest::option::of(arb_money())).prop_map(move |(value, loan)| {
        PhysicalAsset::new(
            user,
            CreatePhysicalAsset {
                name: "Generated".to_string(),
                current_value: value,
                loan: loan.map(|balance| LoanInfo {
                    balance,
                    lender: None,
                    rate: None,
                }),
            },
        )
    })
}

fn arb_debt(user: Uuid) -> impl Strategy<Value = Debt> {
    arb_signed_money().prop_map(move |remaining| {
        Debt::new(
            user,
            CreateDebt {
                name: "Generated".to_string(),
                total_amount: BigDecimal::from(100_000),
                remaining_balance: remaining,
                interest_rate: None,
                minimum_payment: None,
            },
        )
    })
}

fn arb_holdings() -> impl Strategy<Value = UserHoldings> {
    let user = Uuid::new_v4();
    (
        proptest::collection::vec(arb_account(user), 0..8),
        proptest::collection::vec(arb_investment(user), 0..5),
        proptest::collection::vec(arb_asset(user), 0..4),
        proptest::collection::vec(arb_debt(user), 0..4),
    )
        .prop_map(|(accounts, investments, physical_assets, debts)| UserHoldings {
            accounts,
            investments,
            physical_assets,
            debts,
        })
}

fn goal(user: Uuid, category: &str, current: BigDecimal, target: BigDecimal) -> Goal {
    Goal::new(
        user,
        CreateGoal {
            name: "Generated".to_string(),
            category: category.to_string(),
            priority: None,
            target_amount: target,
            current_amount: Some(current),
            target_date: None,
        },
    )
}

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 10, 16).unwrap()
}

// =============================================================================
// Property Tests
// =============================================================================

proptest! {
    #[test]
    fn prop_net_worth_identity_holds_exactly(holdings in arb_holdings()) {
        let b = compute_breakdown(&holdings, &PriceBook::empty(today()), MissingPricePolicy::Abort).unwrap();

        let expected = &b.liquid_assets + &b.portfolio_value + &b.physical_assets - &b.total_liabilities;
        prop_assert_eq!(&b.net_worth, &expected);
        prop_assert_eq!(b.net_worth.round(2), b.net_worth.clone());
        prop_assert!(b.total_liabilities >= BigDecimal::zero());
    }

    #[test]
    fn prop_milestone_components_sum_to_net_worth(holdings in arb_holdings()) {
        let b = compute_breakdown(&holdings, &PriceBook::empty(today()), MissingPricePolicy::Abort).unwrap();
        let m = NetWorthMilestone::new(Uuid::new_v4(), MilestoneTrigger::DailySnapshot, &b, Utc::now());

        let sum = &m.liquid_assets + &m.portfolio_value + &m.physical_assets - &m.total_liabilities;
        prop_assert_eq!(m.net_worth.clone(), sum);
        prop_assert_eq!(m.breakdown(), b);
    }

    #[test]
    fn prop_equity_is_value_minus_loan(asset in arb_asset(Uuid::new_v4()), new_value in arb_money()) {
        let mut asset = asset;
        let loan = asset.loan_balance.clone().unwrap_or_else(BigDecimal::zero);
        prop_assert_eq!(asset.equity.clone(), &asset.current_value - &loan);

        asset.current_value = new_value;
        asset.recompute_equity();
        asset.recompute_equity();
        prop_assert_eq!(asset.equity.clone(), &asset.current_value - &loan);
    }

    #[test]
    fn prop_completion_tracks_current_vs_target(current in arb_money(), target in arb_money()) {
        let mut g = goal(Uuid::new_v4(), "Vacation", current.clone(), target.clone());
        prop_assert_eq!(g.is_completed, current >= target);

        g.current_amount = &g.current_amount + BigDecimal::from(1);
        g.refresh_derived();
        prop_assert_eq!(g.is_completed, g.current_amount >= g.target_amount);
    }

    #[test]
    fn prop_paid_off_iff_non_positive_remaining(remaining in arb_signed_money()) {
        let d = Debt::new(
            Uuid::new_v4(),
            CreateDebt {
                name: "Generated".to_string(),
                total_amount: BigDecimal::from(1000),
                remaining_balance: remaining.clone(),
                interest_rate: None,
                minimum_payment: None,
            },
        );
        prop_assert_eq!(d.is_paid_off, remaining <= BigDecimal::zero());
        prop_assert_eq!(d.paid_off_at.is_some(), d.is_paid_off);
        prop_assert!(d.remaining_balance >= BigDecimal::zero());
        if d.is_paid_off {
            prop_assert!(d.remaining_balance.is_zero());
        }
    }

    #[test]
    fn prop_allocation_respects_cap_and_current(
        balances in proptest::collection::vec((arb_account_type(), arb_signed_money()), 1..6),
        current in arb_money(),
        category in prop_oneof![Just("Emergency Fund"), Just("Retirement"), Just("Home"), Just("Boat")],
    ) {
        let user = Uuid::new_v4();
        let accounts: Vec<Account> = balances
            .into_iter()
            .map(|(account_type, balance)| Account::new(user, CreateAccount {
                name: "Generated".to_string(),
                account_type,
                balance,
                currency: None,
            }))
            .collect();
        let mut g = goal(user, category, current.clone(), BigDecimal::from(10_000_000));

        if let Ok(d) = select_allocation(&g, &accounts, &HashMap::new()) {
            let account = accounts.iter().find(|a| a.id == d.account_id).unwrap();
            prop_assert!(d.allocated_amount > BigDecimal::zero());
            prop_assert!(d.allocated_amount <= &account.balance * allocation_cap());
            prop_assert!(d.allocated_amount <= current);

            apply_allocation(&mut g, &d, Utc::now());
            let again = select_allocation(&g, &accounts, &HashMap::new()).unwrap();
            apply_allocation(&mut g, &again, Utc::now());
            prop_assert_eq!(g.allocations.len(), 1);
            prop_assert!(g.is_account_backed);
            prop_assert!(g.allocated_total() <= current);
        }
    }
}
