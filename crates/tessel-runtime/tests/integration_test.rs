mod dummy;

use dummy::*;
use tessel_runtime::{
    DeviceProperties, Event, EventStatus, ExecutionError, LaunchError, NdRange, Queue, Stage,
    TargetFamily, transfer, wait,
};

#[test_log::test]
fn created_resource_is_the_same_when_read() {
    let queue = test_queue();
    let resource = Vec::from([0u32, 1, 2]);
    let buffer = queue.create(&resource);

    let obtained_resource = queue.read(&buffer).unwrap();

    assert_eq!(resource, obtained_resource)
}

#[test_log::test]
fn empty_allocates_memory() {
    let queue = test_queue();
    let buffer = queue.empty::<f32>(4);

    assert_eq!(queue.read(&buffer).unwrap(), vec![0.0; 4]);
}

#[test_log::test]
fn execute_elementwise_addition() {
    let queue = test_queue();
    let lhs = queue.create(&[0u32, 1, 2]);
    let rhs = queue.create(&[4u32, 4, 4]);
    let out = queue.empty::<u32>(3);

    let event = queue.launch(
        DummyElementwiseAddition {
            lhs,
            rhs,
            out: out.clone(),
            local_size: 2,
        },
        Stage::single("addition"),
        (),
    );

    wait(&event).unwrap();
    assert_eq!(queue.read(&out).unwrap(), vec![4, 5, 6]);
}

#[test_log::test]
fn local_memory_is_available_to_kernels() {
    let queue = test_queue();
    let data = queue.create(&(0..100u32).collect::<Vec<_>>());

    let event = queue.launch(
        DummyDoubleWithLocalMemory {
            data: data.clone(),
            local_size: 32,
        },
        Stage::single("double"),
        (),
    );

    assert_eq!(event.wait(), Ok(()));
    assert!(event.duration().is_some());
    assert_eq!(
        queue.read(&data).unwrap(),
        (0..100u32).map(|x| x * 2).collect::<Vec<_>>()
    );
}

#[test_log::test]
fn work_completes_in_submission_order() {
    let queue = test_queue();
    let data = queue.create(&[0u32]);

    let slow = queue.launch(
        DummySlowIncrement {
            data: data.clone(),
            millis: 20,
        },
        Stage::single("slow"),
        (),
    );
    let write = queue.write(&data, &[10]);
    let fast = queue.launch(
        DummySlowIncrement {
            data: data.clone(),
            millis: 0,
        },
        Stage::single("fast"),
        (),
    );

    assert_eq!(wait([&fast]), Ok(()));
    assert!(slow.is_complete());
    assert!(write.is_complete());
    assert_eq!(queue.read(&data).unwrap(), vec![11]);
}

#[test_log::test]
fn oversized_workgroup_is_a_launch_error() {
    let queue = test_queue();

    let event = queue.launch(
        DummyShape {
            range: NdRange::linear(128, 128),
            local_memory: 0,
        },
        Stage::new(1, 2, "reduction"),
        (),
    );

    match event.wait() {
        Err(ExecutionError::Failed { stage, source, .. }) => {
            assert_eq!(stage, Stage::new(1, 2, "reduction"));
            assert_eq!(
                source,
                LaunchError::WorkgroupTooLarge {
                    requested: 128,
                    max: 64
                }
            );
        }
        other => panic!("Unexpected result {other:?}"),
    }
}

#[test_log::test]
fn uneven_range_is_a_launch_error() {
    let queue = test_queue();

    let event = queue.launch(
        DummyShape {
            range: NdRange::linear(100, 64),
            local_memory: 0,
        },
        Stage::single("uneven"),
        (),
    );

    assert!(matches!(
        event.wait(),
        Err(ExecutionError::Failed {
            source: LaunchError::InvalidRange { .. },
            ..
        })
    ));
}

#[test_log::test]
fn local_memory_limits_are_enforced() {
    let queue = test_queue();
    let without_local = Queue::new(DeviceProperties::new(TargetFamily::Rcar, 64, false, 0, 1));
    let shape = || DummyShape {
        range: NdRange::linear(64, 64),
        local_memory: 2048,
    };

    let exceeded = queue.launch(shape(), Stage::single("big"), ());
    let unavailable = without_local.launch(shape(), Stage::single("big"), ());

    assert!(matches!(
        exceeded.wait(),
        Err(ExecutionError::Failed {
            source: LaunchError::LocalMemoryExceeded {
                requested: 2048,
                max: 1024
            },
            ..
        })
    ));
    assert!(matches!(
        unavailable.wait(),
        Err(ExecutionError::Failed {
            source: LaunchError::LocalMemoryUnavailable { requested: 2048 },
            ..
        })
    ));
}

#[test_log::test]
fn failure_does_not_poison_the_queue() {
    let queue = test_queue();
    let data = queue.create(&[1u32]);

    let failed = queue.launch(DummyFailure { reason: "boom" }, Stage::single("fail"), ());
    let next = queue.write(&data, &[2]);

    assert!(matches!(failed.status(), EventStatus::Failed(_) | EventStatus::Pending));
    assert!(wait((&failed, &next)).is_err());
    assert_eq!(next.wait(), Ok(()));
    assert_eq!(queue.read(&data).unwrap(), vec![2]);
}

#[test_log::test]
fn dependencies_order_work_across_queues() {
    let first = test_queue();
    let second = test_queue();
    let data = first.create(&[0u32]);

    let slow = first.launch(
        DummySlowIncrement {
            data: data.clone(),
            millis: 30,
        },
        Stage::single("slow"),
        (),
    );
    let after = second.launch(
        DummySlowIncrement {
            data: data.clone(),
            millis: 0,
        },
        Stage::single("after"),
        &slow,
    );

    assert_eq!(after.wait(), Ok(()));
    assert!(slow.is_complete());
    assert_eq!(second.read(&data).unwrap(), vec![2]);
}

#[test_log::test]
fn failed_dependency_skips_the_work() {
    let queue = test_queue();
    let data = queue.create(&[5u32]);
    let failed = queue.launch(DummyFailure { reason: "boom" }, Stage::single("fail"), ());

    let skipped = queue.launch(
        DummySlowIncrement {
            data: data.clone(),
            millis: 0,
        },
        Stage::new(1, 2, "dependent"),
        vec![failed],
    );

    assert!(matches!(
        skipped.wait(),
        Err(ExecutionError::DependencyFailed { stage, .. }) if stage.index == 1
    ));
    assert_eq!(queue.read(&data).unwrap(), vec![5]);
}

#[test_log::test]
fn panicking_kernel_is_reported() {
    struct Panics;

    impl tessel_runtime::Kernel for Panics {
        fn name(&self) -> &'static str {
            "panics"
        }

        fn range(&self) -> NdRange {
            NdRange::linear(1, 1)
        }

        fn execute(&self, _grid: &mut tessel_runtime::Grid<'_>) -> Result<(), LaunchError> {
            panic!("index out of bounds");
        }
    }

    let queue = test_queue();
    let event = queue.launch(Panics, Stage::single("panics"), ());

    assert!(matches!(
        event.wait(),
        Err(ExecutionError::Failed {
            source: LaunchError::Kernel { .. },
            ..
        })
    ));
    assert_eq!(queue.sync(), Ok(()));
}

#[test_log::test]
fn host_copies() {
    let queue = test_queue();
    let buffer = transfer::copy_to_device(&queue, &[1.5f64, 2.5, 3.5]);
    transfer::copy_into_device(&queue, &[9.0], &buffer);
    let mut host = [0.0; 2];

    let event = transfer::copy_to_host(&queue, &buffer, &mut host).unwrap();

    assert!(event.is_complete());
    assert_eq!(host, [9.0, 2.5]);
}

#[test_log::test]
fn oversized_write_fails() {
    let queue = test_queue();
    let buffer = queue.empty::<u32>(1);

    assert!(queue.write(&buffer, &[1, 2]).wait().is_err());
}

#[test_log::test]
fn wait_on_nothing_returns_immediately() {
    assert_eq!(wait(()), Ok(()));
    assert_eq!(wait(Vec::<Event>::new()), Ok(()));
}
