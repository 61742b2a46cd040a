//! Task command grammar and mutation model for tasky.

pub mod audit;
pub mod builder;
pub mod capture;
pub mod coerce;
pub mod command;
pub mod config;
pub mod events;
pub mod planner;
pub mod render;
pub mod schema;
pub mod store;
pub mod task;
pub mod token;

#[cfg(test)]
mod test_env;

pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::version;

    #[test]
    fn version_is_not_empty() {
        assert!(!version().is_empty());
    }
}
