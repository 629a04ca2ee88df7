//! Scenario tests for allocation, validation and milestones.
//!
//! These exercise the library the way the API and admin CLI do, minus the database.

use std::collections::HashMap;

use bigdecimal::BigDecimal;
use chrono::{Duration, NaiveDate, Utc};
use uuid::Uuid;

use wealthwise_backend::errors::AppError;
use wealthwise_backend::models::{
    Account, AccountType, CreateAccount, CreateGoal, CreateTransaction, Goal, MilestoneTrigger, NetWorthBreakdown,
    NetWorthMilestone, Transaction,
};
use wealthwise_backend::services::allocation_service::{
    apply_allocation, commitments_excluding, rollback, select_allocation,
};
use wealthwise_backend::services::snapshot_service::trend;
use wealthwise_backend::services::validation_service::validate;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn dec(s: &str) -> BigDecimal {
    s.parse().unwrap()
}

fn account(user: Uuid, account_type: AccountType, balance: &str) -> Account {
    Account::new(
        user,
        CreateAccount {
            name: format!("{} account", account_type),
            account_type,
            balance: dec(balance),
            currency: None,
        },
    )
}

fn goal(user: Uuid, category: &str, current: &str) -> Goal {
    Goal::new(
        user,
        CreateGoal {
            name: format!("{} goal", category),
            category: category.to_string(),
            priority: None,
            target_amount: dec("20000"),
            current_amount: Some(dec(current)),
            target_date: None,
        },
    )
}

// ---------------------------------------------------------------------------
// Allocation
// ---------------------------------------------------------------------------

#[test]
fn emergency_fund_goal_is_backed_by_savings() {
    let user = Uuid::new_v4();
    let savings = account(user, AccountType::Savings, "10000");
    let checking = account(user, AccountType::Checking, "500");
    let mut g = goal(user, "Emergency Fund", "4000");

    let decision = select_allocation(&g, &[savings.clone(), checking], &HashMap::new()).unwrap();
    assert_eq!(decision.account_id, savings.id);
    assert_eq!(decision.allocated_amount, dec("4000"));

    apply_allocation(&mut g, &decision, Utc::now());
    assert!(g.is_account_backed);
    assert_eq!(g.linked_account_id, Some(savings.id));
}

#[test]
fn retirement_goal_falls_back_to_checking() {
    let user = Uuid::new_v4();
    let checking = account(user, AccountType::Checking, "200");
    let g = goal(user, "Retirement", "1000");

    let decision = select_allocation(&g, &[checking.clone()], &HashMap::new()).unwrap();
    assert_eq!(decision.account_id, checking.id);
    assert_eq!(decision.allocated_amount, dec("160"));
}

#[test]
fn allocating_twice_keeps_one_record_per_account() {
    let user = Uuid::new_v4();
    let accounts = vec![account(user, AccountType::Savings, "10000")];
    let mut g = goal(user, "Emergency Fund", "4000");

    for _ in 0..2 {
        let d = select_allocation(&g, &accounts, &HashMap::new()).unwrap();
        apply_allocation(&mut g, &d, Utc::now());
    }
    assert_eq!(g.allocations.len(), 1);

    // A goal's own earlier allocation does not count against it.
    let committed = commitments_excluding(&g.allocations, g.id);
    assert!(committed.is_empty());
    let d = select_allocation(&g, &accounts, &committed).unwrap();
    assert_eq!(d.allocated_amount, dec("4000"));
}

#[test]
fn reallocating_to_a_richer_account_replaces_the_record() {
    let user = Uuid::new_v4();
    let old = account(user, AccountType::Savings, "10000");
    let mut g = goal(user, "Emergency Fund", "4000");
    let d = select_allocation(&g, &[old.clone()], &HashMap::new()).unwrap();
    apply_allocation(&mut g, &d, Utc::now());

    let richer = account(user, AccountType::Savings, "20000");
    let d = select_allocation(&g, &[old, richer.clone()], &HashMap::new()).unwrap();
    apply_allocation(&mut g, &d, Utc::now());

    assert_eq!(g.allocations.len(), 1);
    assert_eq!(g.linked_account_id, Some(richer.id));
    assert!(g.allocated_total() <= g.current_amount);
}

#[test]
fn two_goals_cannot_overcommit_one_account() {
    let user = Uuid::new_v4();
    let accounts = vec![account(user, AccountType::Savings, "10000")];
    let mut first = goal(user, "Emergency Fund", "6000");
    let second = goal(user, "Vacation", "6000");

    let d = select_allocation(&first, &accounts, &HashMap::new()).unwrap();
    apply_allocation(&mut first, &d, Utc::now());

    let committed = commitments_excluding(&first.allocations, second.id);
    let d2 = select_allocation(&second, &accounts, &committed).unwrap();
    assert_eq!(d2.allocated_amount, dec("2000"));
    assert!(&d.allocated_amount + &d2.allocated_amount <= dec("8000"));
}

#[test]
fn goal_without_candidates_reports_no_suitable_account() {
    let user = Uuid::new_v4();
    let g = goal(user, "Home", "100");
    let err = select_allocation(&g, &[], &HashMap::new()).unwrap_err();
    assert!(matches!(err, AppError::NoSuitableAccount(_)));
}

#[test]
fn rollback_leaves_goal_unbacked() {
    let user = Uuid::new_v4();
    let accounts = vec![account(user, AccountType::Savings, "10000")];
    let mut g = goal(user, "Emergency Fund", "4000");
    let d = select_allocation(&g, &accounts, &HashMap::new()).unwrap();
    apply_allocation(&mut g, &d, Utc::now());

    let removed = rollback(&mut g);
    assert_eq!(removed.len(), 1);
    assert!(!g.is_account_backed);
    assert!(g.linked_account_id.is_none());
    assert!(g.allocations.is_empty());
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

#[test]
fn validator_reports_detached_transactions_and_overdrawn_account() {
    let user = Uuid::new_v4();
    let detached = |amount: i64| {
        let mut t = Transaction::new(
            user,
            CreateTransaction {
                account_id: Uuid::new_v4(),
                amount: BigDecimal::from(amount),
                category: None,
                description: Some("Imported".to_string()),
                transaction_date: NaiveDate::from_ymd_opt(2026, 9, 30).unwrap(),
            },
        );
        t.account_id = None;
        t
    };
    let overdrawn = account(user, AccountType::Checking, "-50");
    let card = account(user, AccountType::Credit, "-900");

    let report = validate(&[detached(-10), detached(-20)], &[overdrawn.clone(), card], &[]);

    assert!(!report.is_valid);
    assert_eq!(report.issues.len(), 2);
    assert!(report.issues.iter().any(|i| i.contains("2 transactions")));
    assert!(report.issues.iter().any(|i| i.contains(&overdrawn.name) && i.contains(&overdrawn.id.to_string())));
}

// ---------------------------------------------------------------------------
// Milestones
// ---------------------------------------------------------------------------

#[test]
fn milestone_breakdown_sums_to_net_worth() {
    let b = NetWorthBreakdown::from_components(dec("1234.567"), dec("9876.543"), dec("5000.005"), dec("333.333"));
    let m = NetWorthMilestone::new(Uuid::new_v4(), MilestoneTrigger::Transaction, &b, Utc::now());

    assert_eq!(m.trigger, "transaction");
    assert_eq!(
        m.net_worth,
        &m.liquid_assets + &m.portfolio_value + &m.physical_assets - &m.total_liabilities
    );
}

#[test]
fn trend_reports_change_between_first_and_last_milestone() {
    let user = Uuid::new_v4();
    let at = |net: &str, days_ago: i64| {
        let b = NetWorthBreakdown::from_components(dec(net), dec("0"), dec("0"), dec("0"));
        NetWorthMilestone::new(user, MilestoneTrigger::MonthlySnapshot, &b, Utc::now() - Duration::days(days_ago))
    };

    let t = trend(&[at("8000", 60), at("9000", 30), at("7000", 0)]).unwrap();
    assert_eq!(t.change, dec("-1000"));
    assert_eq!(t.change_percent, Some(dec("-12.5")));
    assert_eq!(t.samples, 3);
}
