/// Backend module: streak and goal state, feature unlocks, local ledgers,
/// the content facade over the generative API, and the time challenge.
pub mod utility;
pub mod storage;
pub mod session;
pub mod streaks;
pub mod goals;
pub mod unlocks;
pub mod journals;
pub mod calendar;

pub mod ai_provider;
pub mod content;
pub mod safety;
pub mod geolocation;
pub mod sharing;

pub mod challenge;
pub mod requests;
pub mod dashboard;
pub mod circles;
