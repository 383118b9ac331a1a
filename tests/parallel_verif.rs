mod common;

use std::thread;

use approx::assert_relative_eq;
use nalgebra::DVector;

use common::{assemble_residual, perturbed_solution, silicon, with_history, SyntheticBulk};
use vfvm_ohmic::discretization::generator::{Strip, StripBuilder};
use vfvm_ohmic::discretization::mesh::COND_PSI;
use vfvm_ohmic::models::SiliconBand;
use vfvm_ohmic::numerics::transient::{TimeContext, TimeStep};
use vfvm_ohmic::parallel::{Communicator, NoComm, SharedMemoryComm};
use vfvm_ohmic::physics::ohmic::{OhmicConfig, Statistics, Terminal};
use vfvm_ohmic::{BoundaryCondition, OhmicContact};

fn partitioned_strip(partitions: usize) -> Strip {
    let mut strip = StripBuilder::default()
        .nx(3)
        .ny(6)
        .insulator_caps(true)
        .partitions(partitions)
        .build(&SiliconBand::default());
    with_history(&mut strip.mesh);
    strip
}

/// One accepted step on `comm`'s share of the strip.
fn accept_step<C: Communicator>(
    strip: &Strip,
    config: OhmicConfig,
    time: &TimeContext,
    x: &DVector<f64>,
    comm: &C,
) -> Terminal {
    let bulk = SyntheticBulk::default();
    let mut bc = OhmicContact::new(&strip.mesh, &strip.binding("anode"), &silicon(), config, comm.rank())
        .unwrap();
    assemble_residual(&mut bc, Some(&bulk), &strip.mesh, time, x).unwrap();
    bc.on_solution_accepted(&strip.mesh, x, comm);
    *bc.terminal()
}

fn run_partitioned(
    partitions: usize,
    config: OhmicConfig,
    time: &TimeContext,
    edit: impl Fn(&Strip, &mut DVector<f64>),
) -> Vec<Terminal> {
    let strip = partitioned_strip(partitions);
    let mut x = perturbed_solution(&strip.mesh);
    edit(&strip, &mut x);

    let comms = SharedMemoryComm::universe(partitions);
    thread::scope(|s| {
        let handles: Vec<_> = comms
            .into_iter()
            .map(|comm| {
                let (strip, x) = (&strip, &x);
                s.spawn(move || accept_step(strip, config, time, x, &comm))
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    })
}

fn no_edit(_: &Strip, _: &mut DVector<f64>) {}

#[test]
fn terminal_current_does_not_depend_on_the_partition() {
    common::init_tracing();
    let cases = [
        (OhmicConfig::default().with_z_width(1e-6), TimeContext::Steady),
        (
            OhmicConfig::infinite(Statistics::Boltzmann),
            TimeContext::Transient(TimeStep::bdf2(1e-9, 2e-9)),
        ),
        (OhmicConfig::infinite(Statistics::Fermi), TimeContext::Steady),
    ];

    for (config, time) in cases {
        let serial = {
            let strip = partitioned_strip(1);
            let x = perturbed_solution(&strip.mesh);
            accept_step(&strip, config, &time, &x, &NoComm)
        };
        assert!(serial.current() != 0.0);

        for partitions in 1..=3 {
            let terminals = run_partitioned(partitions, config, &time, no_edit);
            assert_eq!(terminals.len(), partitions);
            for terminal in &terminals {
                assert_relative_eq!(terminal.current(), serial.current(), max_relative = 1e-12);
                assert_relative_eq!(terminal.potential(), serial.potential(), max_relative = 1e-12);
            }
            // Each process only contributes its own rows to the pass current.
            let summed: f64 = terminals.iter().map(Terminal::pass_current).sum();
            assert_relative_eq!(summed, serial.current(), max_relative = 1e-12);
        }
    }
}

#[test]
fn terminal_potential_averages_owned_metal_nodes() {
    let uniform = |strip: &Strip, x: &mut DVector<f64>| {
        for j in 0..strip.ny {
            x[strip.metal_node(j).row(COND_PSI)] = 1.0;
        }
    };
    let alternating = |strip: &Strip, x: &mut DVector<f64>| {
        for j in 0..strip.ny {
            x[strip.metal_node(j).row(COND_PSI)] = if j % 2 == 0 { 0.0 } else { 2.0 };
        }
    };

    for partitions in 1..=3 {
        for terminal in run_partitioned(partitions, OhmicConfig::default(), &TimeContext::Steady, uniform) {
            assert_relative_eq!(terminal.potential(), 1.0, max_relative = 1e-15);
        }
        for terminal in run_partitioned(partitions, OhmicConfig::default(), &TimeContext::Steady, alternating) {
            assert_relative_eq!(terminal.potential(), 1.0, max_relative = 1e-15);
        }
    }
}
