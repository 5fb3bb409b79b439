mod common;

use std::time::Instant;

use approx::assert_relative_eq;
use common::bench;
use common::bench_with;
use common::with_odometry;
use common::Bench;
use embassy_futures::block_on;
use embassy_futures::join::join;
use embassy_time::Duration;
use embassy_time::Timer;
use launcher_firmware::control::wrap_degrees;
use launcher_firmware::control::Pose;
use launcher_firmware::resources::Driver;
use launcher_firmware::resources::MotionCommand;
use launcher_firmware::resources::MotionOutcome;
use launcher_firmware::sim::sim_robot_config;

fn turn(bench: &mut Bench, target_deg: f32) -> MotionOutcome {
    let robot = &bench.robot;
    block_on(with_odometry(&mut bench.tracker, &robot.odometry, async {
        let mut drive = robot.drive(Driver::Autonomous).unwrap();
        drive.turn_to_angle(target_deg).await
    }))
}

#[test]
fn test_drive_dist_reaches_target() {
    let Bench { world, robot, mut tracker } = bench();

    let outcome = block_on(with_odometry(&mut tracker, &robot.odometry, async {
        let mut drive = robot.drive(Driver::Autonomous).unwrap();
        drive.drive_dist(100.0, None).await
    }));

    assert_eq!(outcome, MotionOutcome::Settled);
    let pose = robot.position();
    assert_relative_eq!(pose.x, 100.0, epsilon = 2.0);
    assert_relative_eq!(pose.y, 0.0, epsilon = 0.5);
    assert_relative_eq!(pose.heading, 0.0, epsilon = 0.5);
    assert_relative_eq!(world.true_pose().x, pose.x, epsilon = 1.0);
    assert_eq!(world.drive_mv(), (0, 0));
}

#[test]
fn test_turn_takes_shorter_rotation() {
    let mut first = bench();
    assert_eq!(turn(&mut first, 370.0), MotionOutcome::Settled);
    let wrapped = first.robot.position().heading;

    let mut second = bench();
    assert_eq!(turn(&mut second, 10.0), MotionOutcome::Settled);
    let direct = second.robot.position().heading;

    // 370 is reached as +10, never by a full extra revolution
    assert_relative_eq!(wrapped, 10.0, epsilon = 1.5);
    assert_relative_eq!(direct, 10.0, epsilon = 1.5);
    assert!(wrap_degrees(wrapped - direct).abs() < 2.0);
}

#[test]
fn test_turn_ignores_accumulated_revolutions() {
    let mut multi_turn = bench_with(sim_robot_config(), Pose::new(0.0, 0.0, 720.0));
    assert_eq!(turn(&mut multi_turn, 10.0), MotionOutcome::Settled);
    assert_relative_eq!(multi_turn.robot.position().heading, 730.0, epsilon = 1.5);

    let mut negative = bench();
    assert_eq!(turn(&mut negative, -307.0), MotionOutcome::Settled);
    assert_relative_eq!(negative.robot.position().heading, 53.0, epsilon = 1.5);
}

#[test]
fn test_drive_dist_timeout_on_jammed_chassis() {
    let Bench { world, robot, mut tracker } = bench();
    world.set_jammed(true);

    let start = Instant::now();
    let outcome = block_on(with_odometry(&mut tracker, &robot.odometry, async {
        let mut drive = robot.drive(Driver::Autonomous).unwrap();
        drive.drive_dist_timeout(100.0, 200, None).await
    }));
    let elapsed = start.elapsed().as_millis();

    assert_eq!(outcome, MotionOutcome::TimedOut);
    assert!(elapsed >= 195 && elapsed < 400, "returned after {} ms", elapsed);
    assert_relative_eq!(robot.position().x, 0.0, epsilon = 0.1);
    assert_eq!(world.drive_mv(), (0, 0));
}

#[test]
fn test_turn_stall_timeout() {
    let mut config = sim_robot_config();
    config.chassis.turn_timeout_ms = 300;
    let mut stalled = bench_with(config, Pose::origin());
    stalled.world.set_jammed(true);

    let start = Instant::now();
    assert_eq!(turn(&mut stalled, 90.0), MotionOutcome::TimedOut);
    assert!(start.elapsed().as_millis() < 600);
}

#[test]
fn test_drive_to_point_turns_then_drives() {
    let Bench { robot, mut tracker, .. } = bench();

    let outcome = block_on(with_odometry(&mut tracker, &robot.odometry, async {
        let mut drive = robot.drive(Driver::Autonomous).unwrap();
        drive.execute(MotionCommand::DriveToPoint { x: 0.0, y: 50.0, reverse: false }).await
    }));

    assert_eq!(outcome, MotionOutcome::Settled);
    let pose = robot.position();
    assert_relative_eq!(pose.heading, 90.0, epsilon = 1.5);
    assert_relative_eq!(pose.y, 50.0, epsilon = 2.0);
    assert_relative_eq!(pose.x, 0.0, epsilon = 2.0);
}

#[test]
fn test_drive_to_point_in_reverse() {
    let Bench { world, robot, mut tracker } = bench();

    let outcome = block_on(with_odometry(&mut tracker, &robot.odometry, async {
        let mut drive = robot.drive(Driver::Autonomous).unwrap();
        drive.drive_to_point(-60.0, 0.0, true).await
    }));

    assert_eq!(outcome, MotionOutcome::Settled);
    let pose = robot.position();
    // backs up without turning around
    assert_relative_eq!(pose.heading, 0.0, epsilon = 1.5);
    assert_relative_eq!(pose.x, -60.0, epsilon = 2.0);
    let (_, highest) = world.drive_mv_range();
    assert!(highest <= 0);
}

#[test]
fn test_drive_to_point_already_there() {
    let Bench { world, robot, mut tracker } = bench();

    let outcome = block_on(with_odometry(&mut tracker, &robot.odometry, async {
        let mut drive = robot.drive(Driver::Autonomous).unwrap();
        drive.drive_to_point(0.5, 0.0, false).await
    }));

    assert_eq!(outcome, MotionOutcome::Settled);
    assert_eq!(world.drive_mv_range(), (0, 0));
}

#[test]
fn test_voltage_percent_halves_output_and_keeps_sign() {
    let Bench { world, robot, mut tracker } = bench();

    let (outcome, during) = block_on(with_odometry(&mut tracker, &robot.odometry, async {
        let motion = async {
            let mut drive = robot.drive(Driver::Autonomous).unwrap();
            drive.drive_to_point(100.0, 0.0, false).await
        };
        let scaler = async {
            Timer::after(Duration::from_millis(300)).await;
            let before = robot.chassis.get_commanded_mv();
            robot.chassis.set_voltage_percent(50);
            world.reset_drive_mv_range();
            Timer::after(Duration::from_millis(50)).await;
            (before, robot.chassis.get_commanded_mv())
        };
        join(motion, scaler).await
    }));

    assert_eq!(outcome, MotionOutcome::Settled);
    let (before, after) = during;
    assert_eq!(before, (12_000, 12_000));
    assert_eq!(after, (6_000, 6_000));

    let (lowest, highest) = world.drive_mv_range();
    assert_eq!(highest, 6_000);
    assert!(lowest >= 0);
    assert_relative_eq!(robot.position().x, 100.0, epsilon = 2.0);
}

#[test]
fn test_joystick_mixing_is_clamped() {
    let Bench { world, robot, .. } = bench();
    let mut drive = robot.drive(Driver::Teleop).unwrap();

    drive.move_joystick(0.5, 0.25);
    assert_eq!(world.drive_mv(), (9_000, 3_000));

    drive.move_joystick(1.0, 1.0);
    assert_eq!(world.drive_mv(), (12_000, 0));

    // open loop ignores the closed-loop voltage percent
    drive.set_voltage_percent(50);
    drive.move_joystick(-2.0, 0.0);
    assert_eq!(world.drive_mv(), (-12_000, -12_000));
}
