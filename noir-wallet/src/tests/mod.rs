//! Wallet behaviour tests
//!
//! Unit tests for individual building blocks live next to them; these drive the
//! [`Wallet`](crate::Wallet) facade end to end.

mod asset_tests;



mod classification_tests;
