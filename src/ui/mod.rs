pub mod filter;
pub mod state;

pub use filter::InstallmentFilter;
pub use state::Pager;
