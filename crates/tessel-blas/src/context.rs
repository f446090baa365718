use tessel_runtime::{
    DeviceProperties, Event, ExecutionError, IntoEvents, Kernel, NdRange, Queue, Stage,
    TargetFamily,
};

use crate::{
    ConfigError, Element,
    kernels::{
        AssignReductionFinalKernel, AssignReductionPartialKernel, GbmvKernel, GemvKernel,
        ReductionKernel, TiledGemmKernel, VectorKernel, candidate_memory, linear_range,
    },
    operation::{
        AssignReduction, Gbmv, Gemm, GemmPartial, Gemv, Operation, ReduceOperator, Reduction,
        ReductionDim, ReductionProblem, VectorOp,
    },
};

/// Default workgroup size of linear kernels, capped by the device maximum.
const LINEAR_WORKGROUP_SIZE: u32 = 256;
/// Workgroups per compute unit targeted when splitting work across workgroups.
const GROUPS_PER_COMPUTE_UNIT: usize = 4;

/// Launch overrides and dependencies of one [execute](ExecutionContext::execute_with) call.
///
/// Sizes are in work items along the first dimension. Kernels whose range is fixed by their
/// configuration only accept overrides equal to that range.
#[derive(Clone, Debug, Default)]
pub struct ExecuteOptions {
    local_size: Option<u32>,
    global_size: Option<u32>,
    local_memory_size: Option<usize>,
    dependencies: Vec<Event>,
}

impl ExecuteOptions {
    /// No override, no dependency.
    pub fn new() -> Self {
        Self::default()
    }

    /// Work items per workgroup.
    pub fn with_local_size(mut self, local_size: u32) -> Self {
        self.local_size = Some(local_size);
        self
    }

    /// Total work items.
    pub fn with_global_size(mut self, global_size: u32) -> Self {
        self.global_size = Some(global_size);
        self
    }

    /// Local memory per workgroup, in bytes.
    pub fn with_local_memory_size(mut self, local_memory_size: usize) -> Self {
        self.local_memory_size = Some(local_memory_size);
        self
    }

    /// Start the operation only after `events` completed, they can come from another context.
    pub fn after<T: IntoEvents>(mut self, events: T) -> Self {
        events.collect_events(&mut self.dependencies);
        self
    }
}

/// Drives one device queue.
///
/// The device facts used by the dispatch heuristics are read once, when the context is created.
/// [execute](Self::execute) only enqueues and never blocks; the returned events are awaited with
/// [wait](Self::wait) or passed as dependencies to later operations.
#[derive(Clone, Debug)]
pub struct ExecutionContext {
    queue: Queue,
    max_workgroup_size: u32,
    local_memory: bool,
    max_local_memory_size: usize,
    compute_units: u32,
    family: TargetFamily,
}

impl Default for ExecutionContext {
    fn default() -> Self {
        Self::new(Queue::default())
    }
}

impl ExecutionContext {
    /// Create a context owning `queue`.
    pub fn new(queue: Queue) -> Self {
        let properties = queue.properties();
        log::debug!(
            "Execution context on {} ({} family): max workgroup {}, local memory {}, {} compute units",
            queue.id(),
            properties.family(),
            properties.max_workgroup_size(),
            properties.has_local_memory(),
            properties.compute_units(),
        );

        Self {
            max_workgroup_size: properties.max_workgroup_size(),
            local_memory: properties.has_local_memory(),
            max_local_memory_size: properties.max_local_memory_size(),
            compute_units: properties.compute_units(),
            family: properties.family(),
            queue,
        }
    }

    /// The queue.
    pub fn queue(&self) -> &Queue {
        &self.queue
    }

    /// Every property of the device.
    pub fn properties(&self) -> &DeviceProperties {
        self.queue.properties()
    }

    /// Maximum work items per workgroup.
    pub fn max_workgroup_size(&self) -> u32 {
        self.max_workgroup_size
    }

    /// Whether the device has workgroup-shared local memory.
    pub fn has_local_memory(&self) -> bool {
        self.local_memory
    }

    /// Maximum local memory per workgroup, in bytes.
    pub fn max_local_memory_size(&self) -> usize {
        self.max_local_memory_size
    }

    /// Number of compute units.
    pub fn compute_units(&self) -> u32 {
        self.compute_units
    }

    /// Hardware family, selects the tuning table.
    pub fn family(&self) -> TargetFamily {
        self.family
    }

    /// Enqueue an operation, see [execute_with](Self::execute_with).
    pub fn execute<E: Element>(&self, operation: Operation<'_, E>) -> Result<Vec<Event>, ConfigError> {
        self.execute_with(operation, ExecuteOptions::default())
    }

    /// Enqueue the kernels of an operation.
    ///
    /// Returns one event per enqueued kernel, in stage order: staged operations (tall-skinny
    /// GEMM, vector to scalar reductions) return two. Operations writing nothing return no event.
    /// Nothing is enqueued when an error is returned.
    pub fn execute_with<E: Element>(
        &self,
        operation: Operation<'_, E>,
        options: ExecuteOptions,
    ) -> Result<Vec<Event>, ConfigError> {
        log::trace!("Execute {} on {}", operation.name(), self.queue.id());

        match operation {
            Operation::Gemm(gemm) => self.gemm(&gemm, options),
            Operation::GemmPartial(partial) => {
                if partial.problem.is_empty() {
                    return Ok(Vec::new());
                }
                let kernel = TiledGemmKernel::partial(&partial);
                self.check_fixed(&options, &kernel)?;
                Ok(vec![self.launch(kernel, None, options)])
            }
            Operation::Reduction(reduction) => self.reduction(&reduction, options),
            Operation::AssignReduction(reduction) => self.assign_reduction(&reduction, options),
            Operation::Gemv(gemv) => self.gemv(&gemv, options),
            Operation::Gbmv(gbmv) => self.gbmv(&gbmv, options),
            Operation::Vector(op) => self.vector(&op, options),
        }
    }

    /// Block until every event completed, returns the first failure.
    ///
    /// Accepts any nesting of events; returns immediately without any.
    pub fn wait<T: IntoEvents>(&self, events: T) -> Result<(), ExecutionError> {
        tessel_runtime::wait(events)
    }

    /// Block until every operation enqueued on the queue completed.
    pub fn wait_all(&self) -> Result<(), ExecutionError> {
        self.queue.sync()
    }

    fn launch<K: Kernel>(&self, kernel: K, stage: Option<Stage>, options: ExecuteOptions) -> Event {
        let stage = stage.unwrap_or_else(|| Stage::single(kernel.name()));
        self.queue.launch(kernel, stage, options.dependencies)
    }

    fn gemm<E: Element>(
        &self,
        gemm: &Gemm<'_, E>,
        options: ExecuteOptions,
    ) -> Result<Vec<Event>, ConfigError> {
        if gemm.problem.is_empty() {
            return Ok(Vec::new());
        }

        let num_partials = match gemm.is_tall_skinny() {
            true => self.num_partials(gemm),
            false => 1,
        };

        if num_partials == 1 {
            let kernel = TiledGemmKernel::new(gemm);
            self.check_fixed(&options, &kernel)?;
            return Ok(vec![self.launch(kernel, None, options)]);
        }

        let problem = gemm.problem;
        let scratch = self
            .queue
            .empty::<E>(GemmPartial::<E>::scratch_len(&problem, num_partials));
        let partial = GemmPartial::new(gemm.config, problem, gemm.a, gemm.b, &scratch, num_partials)?;

        let matrix = problem.m * problem.n;
        let reduction_problem = ReductionProblem::new(matrix, num_partials, ReductionDim::Outer)
            .with_output_layout(problem.m, problem.ldc)
            .with_batch(problem.batch_size, num_partials * matrix, problem.stride_c);
        let reduction = Reduction::with_epilogue(
            ReduceOperator::Add,
            reduction_problem,
            gemm.alpha,
            &scratch,
            gemm.beta,
            gemm.c,
        )?;

        let kernel = TiledGemmKernel::partial(&partial);
        self.check_fixed(&options, &kernel)?;
        let workgroup_size = self.linear_workgroup_size();
        let reduce = ReductionKernel::new(
            &reduction,
            ReductionKernel::<E>::default_range(&reduction_problem, workgroup_size),
            0,
        );
        log::debug!(
            "Tall-skinny gemm {}x{}x{} split in {num_partials} partial products",
            problem.m,
            problem.n,
            problem.k
        );

        let partials = self.launch(kernel, Some(Stage::new(0, 2, "gemm_partial")), options);
        let reduced = self
            .queue
            .launch(reduce, Stage::new(1, 2, "reduction"), &partials);

        Ok(vec![partials, reduced])
    }

    /// Depth slices of a tall-skinny product, enough workgroups to fill the compute units.
    fn num_partials<E: Element>(&self, gemm: &Gemm<'_, E>) -> usize {
        let problem = &gemm.problem;
        let tile = &gemm.config.tile;
        let groups = problem.m.div_ceil(tile.block_rows())
            * problem.n.div_ceil(tile.block_cols())
            * problem.batch_size;
        let slices = problem.k.div_ceil(gemm.config.block_depth::<E>()).max(1);
        let target = self.compute_units as usize * GROUPS_PER_COMPUTE_UNIT;

        (target / groups.max(1)).clamp(1, slices)
    }

    fn reduction<E: Element>(
        &self,
        reduction: &Reduction<'_, E>,
        options: ExecuteOptions,
    ) -> Result<Vec<Event>, ConfigError> {
        let problem = reduction.problem;
        if problem.output_len() == 0 {
            return Ok(Vec::new());
        }

        let (range, local_memory) = self.resolve_linear(
            &options,
            self.linear_workgroup_size(),
            |workgroup_size| ReductionKernel::<E>::default_range(&problem, workgroup_size),
            |workgroup_size| ReductionKernel::<E>::local_memory_required(&problem, workgroup_size),
        )?;

        let kernel = ReductionKernel::new(reduction, range, local_memory);
        Ok(vec![self.launch(kernel, None, options)])
    }

    fn assign_reduction<E: Element>(
        &self,
        reduction: &AssignReduction<'_, E>,
        options: ExecuteOptions,
    ) -> Result<Vec<Event>, ConfigError> {
        let n = reduction.n;
        let max_groups = self.compute_units as usize * GROUPS_PER_COMPUTE_UNIT;
        let (range, local_memory) = self.resolve_linear(
            &options,
            self.linear_workgroup_size(),
            |workgroup_size| {
                let groups = n.div_ceil(workgroup_size as usize).clamp(1, max_groups.max(1));
                NdRange::groups_1d(groups as u32, workgroup_size)
            },
            candidate_memory::<E>,
        )?;

        let groups = range.num_groups();
        let values = self.queue.empty::<E>(groups);
        let indices = self.queue.empty::<u64>(groups);
        let partial =
            AssignReductionPartialKernel::new(reduction, &values, &indices, range, local_memory);
        let finish = AssignReductionFinalKernel::new(
            reduction,
            &values,
            &indices,
            range.local[0],
            local_memory,
        );

        let partials = self.launch(
            partial,
            Some(Stage::new(0, 2, "assign_reduction_partial")),
            options,
        );
        let reduced = self.queue.launch(
            finish,
            Stage::new(1, 2, "assign_reduction_final"),
            &partials,
        );

        Ok(vec![partials, reduced])
    }

    fn gemv<E: Element>(
        &self,
        gemv: &Gemv<'_, E>,
        options: ExecuteOptions,
    ) -> Result<Vec<Event>, ConfigError> {
        if gemv.problem.is_empty() {
            return Ok(Vec::new());
        }

        let kernel = GemvKernel::new(gemv);
        self.check_fixed(&options, &kernel)?;
        Ok(vec![self.launch(kernel, None, options)])
    }

    fn gbmv<E: Element>(
        &self,
        gbmv: &Gbmv<'_, E>,
        options: ExecuteOptions,
    ) -> Result<Vec<Event>, ConfigError> {
        if gbmv.problem.is_empty() {
            return Ok(Vec::new());
        }

        let outputs = gbmv.problem.y_len();
        let (range, _) = self.resolve_linear(
            &options,
            gbmv.config.workgroup_size,
            |workgroup_size| linear_range(outputs, workgroup_size),
            |_| 0,
        )?;

        Ok(vec![self.launch(GbmvKernel::new(gbmv, range), None, options)])
    }

    fn vector<E: Element>(
        &self,
        op: &VectorOp<'_, E>,
        options: ExecuteOptions,
    ) -> Result<Vec<Event>, ConfigError> {
        if op.is_empty() {
            return Ok(Vec::new());
        }

        let n = op.n;
        let (range, _) = self.resolve_linear(
            &options,
            self.linear_workgroup_size(),
            |workgroup_size| linear_range(n, workgroup_size),
            |_| 0,
        )?;

        Ok(vec![self.launch(VectorKernel::new(op, range), None, options)])
    }

    fn linear_workgroup_size(&self) -> u32 {
        self.max_workgroup_size.min(LINEAR_WORKGROUP_SIZE)
    }

    /// Launch range and local memory of a linear kernel, applying the overrides.
    fn resolve_linear(
        &self,
        options: &ExecuteOptions,
        default_workgroup_size: u32,
        default_range: impl Fn(u32) -> NdRange,
        local_memory: impl Fn(u32) -> usize,
    ) -> Result<(NdRange, usize), ConfigError> {
        let workgroup_size = options.local_size.unwrap_or(default_workgroup_size);
        if workgroup_size == 0 {
            return Err(ConfigError::invalid_argument(
                "local_size",
                "a workgroup has at least one work item",
            ));
        }
        if workgroup_size > self.max_workgroup_size {
            return Err(ConfigError::WorkgroupTooLarge {
                parameter: "local_size",
                requested: workgroup_size,
                max: self.max_workgroup_size,
            });
        }

        let range = match options.global_size {
            Some(global) if global == 0 || global % workgroup_size != 0 => {
                return Err(ConfigError::invalid_argument(
                    "global_size",
                    format!("{global} isn't a positive multiple of the local size {workgroup_size}"),
                ));
            }
            Some(global) => NdRange::linear(global, workgroup_size),
            None => default_range(workgroup_size),
        };

        let required = local_memory(workgroup_size);
        let local_memory = match options.local_memory_size {
            Some(size) if size < required => {
                return Err(ConfigError::invalid_argument(
                    "local_memory_size",
                    format!("{size} bytes is less than the {required} bytes needed"),
                ));
            }
            Some(size) => size,
            None => required,
        };
        self.check_local_memory(local_memory)?;

        Ok((range, local_memory))
    }

    /// Overrides of a kernel whose range is fixed by its configuration must match it.
    fn check_fixed<K: Kernel>(&self, options: &ExecuteOptions, kernel: &K) -> Result<(), ConfigError> {
        let range = kernel.range();

        if let Some(local) = options.local_size {
            if local != range.workgroup_size() {
                return Err(ConfigError::invalid_argument(
                    "local_size",
                    format!(
                        "{} fixes workgroups of {} work items, not {local}",
                        kernel.name(),
                        range.workgroup_size()
                    ),
                ));
            }
        }

        if let Some(global) = options.global_size {
            let items: u32 = range.global.iter().product();
            if global != items {
                return Err(ConfigError::invalid_argument(
                    "global_size",
                    format!("{} fixes {items} work items, not {global}", kernel.name()),
                ));
            }
        }

        if let Some(size) = options.local_memory_size {
            if size != kernel.local_memory_size() {
                return Err(ConfigError::invalid_argument(
                    "local_memory_size",
                    format!(
                        "{} fixes {} bytes of local memory, not {size}",
                        kernel.name(),
                        kernel.local_memory_size()
                    ),
                ));
            }
        }

        Ok(())
    }

    fn check_local_memory(&self, requested: usize) -> Result<(), ConfigError> {
        if requested == 0 {
            return Ok(());
        }
        if !self.local_memory {
            return Err(ConfigError::LocalMemoryUnsupported {
                parameter: "local_memory_size",
            });
        }
        if requested > self.max_local_memory_size {
            return Err(ConfigError::LocalMemoryTooLarge {
                requested,
                max: self.max_local_memory_size,
            });
        }
        Ok(())
    }
}
