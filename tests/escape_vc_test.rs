mod common;

use common::*;
use cruce::{RouteInfo, Simulation};
use cruce::routing::{NetDest, PortDirection};

fn storm(algorithm: &'static str, seed: u64) -> Simulation {
    // Every router of a 4x4 mesh fires two packets at its diagonal opposite, touching all
    // four quadrants at once.
    let network = create_mesh(MeshBuilder {
        num_rows: 4,
        num_cols: 4,
        vcs_per_vnet: 4,
        buffers_per_data_vc: 2,
        routing_algorithm: algorithm,
        ..Default::default()
    });
    let cv = create_configuration(seed, 10000, network);
    let mut simulation = Simulation::new(&cv);
    for origin in 0..16 {
        for _ in 0..2 {
            simulation.inject_packet(origin, 15 - origin, 0, 4);
        }
    }
    simulation
}

#[test]
fn adaptive_storm_makes_forward_progress() {
    // Under fully adaptive RANDOM routing the escape channel must keep the four-quadrant
    // storm moving until everything drains.
    let mut simulation = storm("RANDOM", 21);
    let mut drained = false;
    for step in 0..10000 {
        simulation.advance();
        if step % 16 == 0 {
            simulation.network.check_credit_conservation();
            simulation.network.check_vc_state_coherence();
        }
        if simulation.network.is_quiescent() {
            drained = true;
            break;
        }
    }
    assert!(drained, "the storm deadlocked");
    assert_eq!(simulation.network.total_ejected_packets(), 32);
}

#[test]
fn turn_model_storm_makes_forward_progress() {
    let mut simulation = storm("TURN_MODEL", 22);
    assert!(simulation.run_until_quiescent(10000), "the storm deadlocked");
    assert_eq!(simulation.network.total_ejected_packets(), 32);
}

#[test]
fn escape_channel_routes_west_first() {
    // On the escape VC the adaptive algorithms collapse to the west-first turn model:
    // quadrants II and III always leave westwards.
    let network = create_mesh(MeshBuilder {
        num_rows: 4,
        num_cols: 4,
        routing_algorithm: "RANDOM",
        ..Default::default()
    });
    let cv = create_configuration(13, 100, network);
    let mut simulation = Simulation::new(&cv);
    let params = &simulation.network.parameters;
    let escape_vc = params.escape_vc(0);
    // Router 5 sits at (1,1); interface 12 at router 12 = (0,3) is quadrant II, interface
    // 0 at router 0 = (0,0) is quadrant III.
    let router = &simulation.network.routers[5];
    for &dest in [12usize, 0].iter() {
        let route = RouteInfo {
            net_dest: NetDest::of_interface(dest, params.num_interfaces()),
            dest_interface: dest,
            dest_router: dest,
        };
        let outport = router.route_compute(&route, 0, PortDirection::Local, escape_vc, escape_vc, 0, params, &mut simulation.rng);
        assert_eq!(router.routing_unit.outport_direction(outport), PortDirection::West);
    }
}

#[test]
fn quadrant_one_stays_adaptive_on_the_escape_channel() {
    // West-first leaves quadrant I free: from (1,1) to (3,3) both East and North remain
    // legal on the escape channel.
    let network = create_mesh(MeshBuilder {
        num_rows: 4,
        num_cols: 4,
        routing_algorithm: "RANDOM",
        ..Default::default()
    });
    let cv = create_configuration(13, 100, network);
    let mut simulation = Simulation::new(&cv);
    let params = &simulation.network.parameters;
    let escape_vc = params.escape_vc(0);
    let router = &simulation.network.routers[5];
    let route = RouteInfo {
        net_dest: NetDest::of_interface(15, params.num_interfaces()),
        dest_interface: 15,
        dest_router: 15,
    };
    for _ in 0..32 {
        let outport = router.route_compute(&route, 0, PortDirection::Local, escape_vc, escape_vc, 0, params, &mut simulation.rng);
        let direction = router.routing_unit.outport_direction(outport);
        assert!(direction == PortDirection::East || direction == PortDirection::North);
    }
}
