//! Shared type definitions for the Ubiquity signal manifold simulation.
//!
//! This crate is the single source of truth for all types used across the
//! Ubiquity workspace. Types defined here flow downstream to `TypeScript`
//! via `ts-rs` for the rendering host.
//!
//! # Modules
//!
//! - [`ids`] -- Sequence-assigned ids and host-chosen string keys
//! - [`enums`] -- Enumeration types (mode, kinds, bands, statuses, barometer)
//! - [`structs`] -- Core entity structs (nodes, wavefronts, signals, warrants, views)

pub mod enums;
pub mod ids;
pub mod structs;

// Re-export all public types at crate root for convenience.
pub use enums::{
    Band, BarometerPhase, Escalation, MintingCondition, Mode, NodeRole, ObjectKind, PhaseTier,
    SignalKind, StrengthTier, WarrantStatus,
};
pub use ids::{IdSequence, NodeId, ObjectId, SignalId, WarrantId, WavefrontId};
pub use structs::{
    AgentSignalState, BreachFlags, EconomicBridge, FieldMetrics, HarmonicTriad, LoudestSignal,
    Node, Point, Signal, SignalCensus, Warrant, WarrantLifecycle, Wavefront, WorldObject,
};

#[cfg(test)]
mod tests {
    //! `TypeScript` binding generation for the rendering host.

    #[test]
    fn export_bindings() {
        // ts-rs writes the files to the `bindings/` directory relative to
        // the crate root.
        use ts_rs::TS;

        // IDs
        let _ = crate::ids::WavefrontId::export_all();
        let _ = crate::ids::SignalId::export_all();
        let _ = crate::ids::WarrantId::export_all();
        let _ = crate::ids::NodeId::export_all();
        let _ = crate::ids::ObjectId::export_all();

        // Enums
        let _ = crate::enums::Mode::export_all();
        let _ = crate::enums::ObjectKind::export_all();
        let _ = crate::enums::NodeRole::export_all();
        let _ = crate::enums::StrengthTier::export_all();
        let _ = crate::enums::SignalKind::export_all();
        let _ = crate::enums::Band::export_all();
        let _ = crate::enums::Escalation::export_all();
        let _ = crate::enums::WarrantStatus::export_all();
        let _ = crate::enums::MintingCondition::export_all();
        let _ = crate::enums::BarometerPhase::export_all();
        let _ = crate::enums::PhaseTier::export_all();

        // Structs
        let _ = crate::structs::Point::export_all();
        let _ = crate::structs::Node::export_all();
        let _ = crate::structs::WorldObject::export_all();
        let _ = crate::structs::Wavefront::export_all();
        let _ = crate::structs::AgentSignalState::export_all();
        let _ = crate::structs::Signal::export_all();
        let _ = crate::structs::Warrant::export_all();
        let _ = crate::structs::HarmonicTriad::export_all();
        let _ = crate::structs::FieldMetrics::export_all();
        let _ = crate::structs::BreachFlags::export_all();
        let _ = crate::structs::EconomicBridge::export_all();
        let _ = crate::structs::LoudestSignal::export_all();
        let _ = crate::structs::SignalCensus::export_all();
        let _ = crate::structs::WarrantLifecycle::export_all();
    }
}
