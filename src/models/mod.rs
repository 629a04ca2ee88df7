mod account;
mod balance_history;
mod daily_price;
mod debt;
mod goal;
mod investment;
mod net_worth;
mod physical_asset;
mod transaction;
mod user;

pub use account::{Account, AccountType, CreateAccount};
pub use balance_history::GoalBalanceChange;
pub use daily_price::{DailyPrice, LatestPrice, PriceSource};
pub use debt::{CreateDebt, Debt, UpdateDebt};
pub use goal::{CreateGoal, Goal, GoalAllocation, GoalCategory, UpdateGoalProgress};
pub use investment::{CreateInvestment, Investment};
pub use net_worth::{MilestoneTrigger, NetWorthBreakdown, NetWorthMilestone, CURRENCY_SCALE};
pub use physical_asset::{CreatePhysicalAsset, LoanInfo, PhysicalAsset, UpdatePhysicalAsset};
pub use transaction::{CreateTransaction, Transaction};
pub use user::User;
