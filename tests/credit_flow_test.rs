mod common;

use common::*;
use cruce::Simulation;

#[test]
fn credit_exhaustion_pauses_and_resumes() {
    // A burst of five 4-flit packets into the same outport with 2 buffers per VC and
    // 2 VCs per vnet. Grants must pause while credits are exhausted and resume as they
    // return, with conservation holding at every cycle.
    let network = create_mesh(MeshBuilder {
        num_rows: 1,
        num_cols: 2,
        vcs_per_vnet: 2,
        buffers_per_data_vc: 2,
        ..Default::default()
    });
    let cv = create_configuration(3, 1000, network);
    let mut simulation = Simulation::new(&cv);
    for _ in 0..5 {
        simulation.inject_packet(0, 1, 0, 4);
    }
    let mut drained = false;
    for _ in 0..1000 {
        simulation.advance();
        simulation.network.check_credit_conservation();
        simulation.network.check_vc_state_coherence();
        if simulation.network.is_quiescent() {
            drained = true;
            break;
        }
    }
    assert!(drained, "the burst did not drain");
    assert_eq!(simulation.network.total_injected_flits(), 20);
    assert_eq!(simulation.network.total_ejected_flits(), 20);
    assert_eq!(simulation.network.total_ejected_packets(), 5);
}

#[test]
fn one_credit_per_flit_one_free_signal_per_packet() {
    let network = create_mesh(MeshBuilder {
        num_rows: 1,
        num_cols: 2,
        vcs_per_vnet: 2,
        buffers_per_data_vc: 2,
        ..Default::default()
    });
    let cv = create_configuration(3, 1000, network);
    let mut simulation = Simulation::new(&cv);
    for _ in 0..5 {
        simulation.inject_packet(0, 1, 0, 4);
    }
    assert!(simulation.run_until_quiescent(1000));
    let origin = &simulation.network.interfaces[0].statistics;
    // Every flit the interface emitted was acknowledged by exactly one credit, and
    // exactly one credit per packet carried the free signal.
    assert_eq!(origin.credits_received, origin.created_flits);
    assert_eq!(origin.free_signals_received, origin.created_packets);
    assert_eq!(origin.created_packets, 5);
    assert_eq!(origin.created_flits, 20);
}

#[test]
fn back_pressure_is_transient_not_fatal() {
    // With a single deep stream and one virtual channel, the source regularly runs out of
    // credits; the run must still complete without any protocol panic.
    let network = create_mesh(MeshBuilder {
        num_rows: 1,
        num_cols: 3,
        vcs_per_vnet: 1,
        buffers_per_data_vc: 1,
        ..Default::default()
    });
    let cv = create_configuration(5, 2000, network);
    let mut simulation = Simulation::new(&cv);
    for _ in 0..3 {
        simulation.inject_packet(0, 2, 0, 6);
    }
    assert!(simulation.run_until_quiescent(2000));
    assert_eq!(simulation.network.total_ejected_packets(), 3);
    simulation.network.check_credit_conservation();
}

#[test]
fn round_robin_serves_competing_inports() {
    // Two continuous streams fight for the East outport of the middle router; round-robin
    // arbitration must let both finish.
    let network = create_mesh(MeshBuilder {
        num_rows: 1,
        num_cols: 3,
        vcs_per_vnet: 2,
        buffers_per_data_vc: 2,
        ..Default::default()
    });
    let cv = create_configuration(9, 3000, network);
    let mut simulation = Simulation::new(&cv);
    for _ in 0..4 {
        simulation.inject_packet(0, 2, 0, 4);
        simulation.inject_packet(1, 2, 0, 4);
    }
    assert!(simulation.run_until_quiescent(3000));
    assert_eq!(simulation.network.interfaces[2].statistics.consumed_packets, 8);
}
