pub mod dispatcher;
pub mod run_setup;
