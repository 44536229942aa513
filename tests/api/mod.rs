mod body_limit_tests;
mod csrf_tests;
mod rate_limit_tests;
