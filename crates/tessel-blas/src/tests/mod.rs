pub mod blas1;
pub mod dispatch;
pub mod reduction;
pub mod utils;

// Generates the test suite against a context, or the default test context.
#[macro_export]
macro_rules! testgen_blas {
    // Every test for one element type.
    (@all $float:ident) => {
        #[test_log::test]
        fn gemm_256_selects_small_config() {
            $crate::tests::gemm::test_gemm_256_selects_small_config::<$float>(&context());
        }

        #[test_log::test]
        fn gemm_configs_on_odd_shapes() {
            $crate::tests::gemm::test_gemm_configs_on_odd_shapes::<$float>(&context());
        }

        #[test_log::test]
        fn gemm_beta_zero_ignores_c() {
            $crate::tests::gemm::test_gemm_beta_zero_ignores_c::<$float>(&context());
        }

        #[test_log::test]
        fn gemm_zero_depth_scales_c() {
            $crate::tests::gemm::test_gemm_zero_depth_scales_c::<$float>(&context());
        }

        #[test_log::test]
        fn gemm_empty_enqueues_nothing() {
            $crate::tests::gemm::test_gemm_empty_enqueues_nothing::<$float>(&context());
        }

        #[test_log::test]
        fn gemm_strided_batch_equals_single_runs() {
            $crate::tests::gemm::test_gemm_strided_batch_equals_single_runs::<$float>(&context());
        }

        #[test_log::test]
        fn gemm_interleaved_batch() {
            $crate::tests::gemm::test_gemm_interleaved_batch::<$float>(&context());
        }

        #[test_log::test]
        fn gemm_tall_skinny() {
            $crate::tests::gemm::test_gemm_tall_skinny::<$float>(&context());
        }

        #[test_log::test]
        fn gemm_tall_skinny_batched() {
            $crate::tests::gemm::test_gemm_tall_skinny_batched::<$float>(&context());
        }

        #[test_log::test]
        fn gemm_joint_matrix() {
            $crate::tests::gemm::test_gemm_joint_matrix::<$float>(&context());
        }

        #[test_log::test]
        fn gemm_rejects_aliased_output() {
            $crate::tests::gemm::test_gemm_rejects_aliased_output::<$float>(&context());
        }

        #[test_log::test]
        fn gemm_rejects_small_operands() {
            $crate::tests::gemm::test_gemm_rejects_small_operands::<$float>(&context());
        }

        #[test_log::test]
        fn gemm_fixed_launch_overrides() {
            $crate::tests::gemm::test_gemm_fixed_launch_overrides::<$float>(&context());
        }

        #[test_log::test]
        fn gemm_failed_dependency_names_the_stage() {
            $crate::tests::gemm::test_gemm_failed_dependency_names_the_stage::<$float>(&context());
        }

        #[test_log::test]
        fn gemv_dispatched_shapes() {
            $crate::tests::gemv::test_gemv_dispatched_shapes::<$float>(&context());
        }

        #[test_log::test]
        fn gemv_beta_zero_ignores_y() {
            $crate::tests::gemv::test_gemv_beta_zero_ignores_y::<$float>(&context());
        }

        #[test_log::test]
        fn gemv_configs() {
            $crate::tests::gemv::test_gemv_configs::<$float>(&context());
        }

        #[test_log::test]
        fn gemv_empty_enqueues_nothing() {
            $crate::tests::gemv::test_gemv_empty_enqueues_nothing::<$float>(&context());
        }

        #[test_log::test]
        fn gemv_rejects_zero_increment() {
            $crate::tests::gemv::test_gemv_rejects_zero_increment::<$float>(&context());
        }

        #[test_log::test]
        fn gbmv_matches_reference() {
            $crate::tests::gbmv::test_gbmv_matches_reference::<$float>(&context());
        }

        #[test_log::test]
        fn gbmv_beta_zero_ignores_y() {
            $crate::tests::gbmv::test_gbmv_beta_zero_ignores_y::<$float>(&context());
        }

        #[test_log::test]
        fn gbmv_rejects_short_leading_dim() {
            $crate::tests::gbmv::test_gbmv_rejects_short_leading_dim::<$float>(&context());
        }

        #[test_log::test]
        fn axpy() {
            $crate::tests::blas1::test_axpy::<$float>(&context());
        }

        #[test_log::test]
        fn scal_copy_swap() {
            $crate::tests::blas1::test_scal_copy_swap::<$float>(&context());
        }

        #[test_log::test]
        fn rot() {
            $crate::tests::blas1::test_rot::<$float>(&context());
        }

        #[test_log::test]
        fn vector_ops_reject_aliasing() {
            $crate::tests::blas1::test_vector_ops_reject_aliasing::<$float>(&context());
        }

        #[test_log::test]
        fn value_reductions() {
            $crate::tests::blas1::test_value_reductions::<$float>(&context());
        }

        #[test_log::test]
        fn index_reductions() {
            $crate::tests::blas1::test_index_reductions::<$float>(&context());
        }

        #[test_log::test]
        fn iamax_ties_take_the_first_index() {
            $crate::tests::blas1::test_iamax_ties_take_the_first_index::<$float>(&context());
        }

        #[test_log::test]
        fn rotmg() {
            $crate::tests::blas1::test_rotmg::<$float>(&context());
        }

        #[test_log::test]
        fn empty_reductions() {
            $crate::tests::blas1::test_empty_reductions::<$float>(&context());
        }

        #[test_log::test]
        fn reduction_kind_must_match_target() {
            $crate::tests::blas1::test_reduction_kind_must_match_target::<$float>(&context());
        }

        #[test_log::test]
        fn reduction_both_dims() {
            $crate::tests::reduction::test_reduction_both_dims::<$float>(&context());
        }

        #[test_log::test]
        fn reduction_epilogue_and_layout() {
            $crate::tests::reduction::test_reduction_epilogue_and_layout::<$float>(&context());
        }

        #[test_log::test]
        fn reduction_launch_overrides() {
            $crate::tests::reduction::test_reduction_launch_overrides::<$float>(&context());
        }

        #[test_log::test]
        fn reduction_rejects_short_output() {
            $crate::tests::reduction::test_reduction_rejects_short_output::<$float>(&context());
        }

        #[test_log::test]
        fn selection_is_deterministic() {
            $crate::tests::dispatch::test_selection_is_deterministic::<$float>(&context());
        }

        #[test_log::test]
        fn no_local_memory_device() {
            $crate::tests::dispatch::test_no_local_memory_device::<$float>(&context());
        }

        #[test_log::test]
        fn chained_operations() {
            $crate::tests::dispatch::test_chained_operations::<$float>(&context());
        }

        #[test_log::test]
        fn wait_without_events() {
            $crate::tests::dispatch::test_wait_without_events::<$float>(&context());
        }

        #[test_log::test]
        fn family_tables() {
            $crate::tests::dispatch::test_family_tables::<$float>(&context());
        }
    };

    // Numerical tests only, for the double precision element.
    (@numerics $float:ident) => {
        #[test_log::test]
        fn gemm_configs_on_odd_shapes() {
            $crate::tests::gemm::test_gemm_configs_on_odd_shapes::<$float>(&context());
        }

        #[test_log::test]
        fn gemm_interleaved_batch() {
            $crate::tests::gemm::test_gemm_interleaved_batch::<$float>(&context());
        }

        #[test_log::test]
        fn gemm_tall_skinny() {
            $crate::tests::gemm::test_gemm_tall_skinny::<$float>(&context());
        }

        #[test_log::test]
        fn gemv_dispatched_shapes() {
            $crate::tests::gemv::test_gemv_dispatched_shapes::<$float>(&context());
        }

        #[test_log::test]
        fn gbmv_matches_reference() {
            $crate::tests::gbmv::test_gbmv_matches_reference::<$float>(&context());
        }

        #[test_log::test]
        fn value_reductions() {
            $crate::tests::blas1::test_value_reductions::<$float>(&context());
        }

        #[test_log::test]
        fn index_reductions() {
            $crate::tests::blas1::test_index_reductions::<$float>(&context());
        }

        #[test_log::test]
        fn reduction_both_dims() {
            $crate::tests::reduction::test_reduction_both_dims::<$float>(&context());
        }

        #[test_log::test]
        fn rotmg() {
            $crate::tests::blas1::test_rotmg::<$float>(&context());
        }
    };

    () => {
        $crate::testgen_blas!($crate::tests::utils::test_context());
    };

    ($context:expr) => {
        mod test_blas {
            #[allow(unused_imports)]
            use super::*;

            fn context() -> $crate::ExecutionContext {
                $context
            }

            mod f32_ty {
                use super::*;

                $crate::testgen_blas!(@all f32);
            }

            mod f64_ty {
                use super::*;

                $crate::testgen_blas!(@numerics f64);
            }
        }
    };
}

#[cfg(test)]
mod suite {
    crate::testgen_blas!();
}
