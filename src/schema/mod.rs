//! OpenF1 wire records
//!
//! Plain serde structures mirroring the JSON arrays served by the upstream
//! endpoints. The schema belongs to a third party, so every field is optional
//! and decoding never fails because a field is absent; consumers degrade to
//! `N/A` placeholders instead.
//!
//! | Endpoint     | Record             |
//! |--------------|--------------------|
//! | `/sessions`  | [`Session`]        |
//! | `/drivers`   | [`Driver`]         |
//! | `/position`  | [`PositionSample`] |
//! | `/laps`      | [`LapRecord`]      |
//! | `/stints`    | [`TyreStint`]      |

pub mod driver;
pub mod lap;
pub mod position;
pub mod session;
pub mod stint;

pub use driver::Driver;
pub use lap::LapRecord;
pub use position::PositionSample;
pub use session::Session;
pub use stint::{TyreCompound, TyreStint};
