//! Integration tests for the agent interoperability core

mod discovery_flow;
mod json_round_trip;
mod negotiation_flow;
mod registry_flow;
mod reputation_properties;
mod support;
