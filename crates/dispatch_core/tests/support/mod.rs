#![allow(dead_code)]

pub mod scenarios;
pub mod stepper;
