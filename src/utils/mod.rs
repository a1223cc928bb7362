pub mod plan_limits;
