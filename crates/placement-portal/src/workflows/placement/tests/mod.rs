mod access;
mod common;
mod eligibility;
