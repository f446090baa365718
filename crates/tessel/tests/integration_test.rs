use tessel::{
    DeviceProperties, Queue, TargetFamily,
    blas::{ExecutionContext, gemm, gemv, tests::utils::test_device},
    transfer::{copy_to_device, copy_to_host},
};

fn rcar_context() -> ExecutionContext {
    ExecutionContext::new(Queue::new(test_device(TargetFamily::Rcar)))
}

tessel_blas::testgen_blas!(rcar_context());

#[test_log::test]
fn gemm_then_gemv_on_one_queue() {
    let context = ExecutionContext::new(Queue::new(DeviceProperties::new(
        TargetFamily::Generic,
        128,
        true,
        64 * 1024,
        2,
    )));
    let queue = context.queue();

    // A is the 2x2 identity scaled by 2, B holds 1..=4 column-major.
    let a = copy_to_device(queue, &[2.0f32, 0.0, 0.0, 2.0]);
    let b = copy_to_device(queue, &[1.0f32, 2.0, 3.0, 4.0]);
    let c = queue.empty::<f32>(4);
    let x = copy_to_device(queue, &[1.0f32, 1.0]);
    let y = queue.empty::<f32>(2);

    let events = gemm(
        &context, 'n', 'n', 2, 2, 2, 1.0, &a, 2, &b, 2, 0.0, &c, 2,
    )
    .unwrap();
    context.wait(events).unwrap();

    let events = gemv(&context, 't', 2, 2, 1.0, &c, 2, &x, 1, 0.0, &y, 1).unwrap();
    context.wait(events).unwrap();

    let mut product = vec![0.0f32; 4];
    copy_to_host(queue, &c, &mut product).unwrap().wait().unwrap();
    assert_eq!(product, vec![2.0, 4.0, 6.0, 8.0]);

    let mut sums = vec![0.0f32; 2];
    copy_to_host(queue, &y, &mut sums).unwrap().wait().unwrap();
    assert_eq!(sums, vec![6.0, 14.0]);
}
