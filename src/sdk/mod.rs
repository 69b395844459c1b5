//! Mobile access SDK abstraction

pub mod access_sdk;
pub mod simulated;
pub mod types;

pub use {
    access_sdk::{
        AccessListener, MobileAccess, ReaderUpdateListener, RegistrationListener, SdkProvider,
        SdkStateListener, SecondFactorSelector,
    },
    simulated::{RegistrationOutcome, RegistrationScript, SimulatedSdk, SimulatedSdkProvider},
};
