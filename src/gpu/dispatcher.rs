//! Compute dispatch with explicit workgroup layout and barriers
//!
//! Owns one compute pipeline and derives its workgroup count from a problem
//! size and a fixed per-workgroup thread count. Dispatches and barriers are
//! queued on the CPU and encoded in one go; a barrier marks a visibility
//! boundary between dependent dispatches.
//!
//! wgpu expresses storage-buffer visibility ordering as compute-pass
//! boundaries: all dispatches inside one pass may observe each other's writes
//! in an undefined order, while writes from one pass are visible to the next.
//! Encoding therefore opens a fresh compute pass for every barrier-delimited
//! run of dispatches. Omitting the barrier between dependent dispatches is a
//! silent-wrong-results bug, not a crash, so the solver emits dispatch+barrier
//! as a unit.

/// Threads per workgroup; must match `@workgroup_size` in the WGSL shaders.
pub const WORKGROUP_SIZE: u32 = 64;

/// Errors raised by dispatcher configuration.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    #[error("problem size and workgroup size must both be non-zero (got {problem_size} / {workgroup_size})")]
    InvalidSize {
        problem_size: u32,
        workgroup_size: u32,
    },
}

/// Which memory scope a barrier covers.
///
/// Only storage buffers are used by the solver today; the scope is kept
/// explicit at call sites so multi-dispatch protocols read as protocols.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BarrierScope {
    Storage,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Dispatch,
    Barrier,
}

/// A compute pipeline plus its workgroup layout and queued command list.
pub struct ComputeDispatcher {
    pipeline: wgpu::ComputePipeline,
    label: String,
    problem_size: u32,
    workgroup_size: u32,
    workgroup_count: u32,
    commands: Vec<Command>,
}

impl ComputeDispatcher {
    /// Create a dispatcher around a compiled compute shader entry point.
    pub fn new(
        device: &wgpu::Device,
        label: &str,
        module: &wgpu::ShaderModule,
        entry_point: &str,
        bind_group_layout: &wgpu::BindGroupLayout,
    ) -> Self {
        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some(label),
            bind_group_layouts: &[bind_group_layout],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_compute_pipeline(&wgpu::ComputePipelineDescriptor {
            label: Some(label),
            layout: Some(&pipeline_layout),
            module,
            entry_point: Some(entry_point),
            compilation_options: Default::default(),
            cache: None,
        });

        Self {
            pipeline,
            label: label.to_string(),
            problem_size: 0,
            workgroup_size: WORKGROUP_SIZE,
            workgroup_count: 0,
            commands: Vec::new(),
        }
    }

    /// Set the problem size and per-workgroup thread count, recomputing the
    /// workgroup count as `ceil(problem_size / workgroup_size)`.
    pub fn configure(
        &mut self,
        problem_size: u32,
        workgroup_size: u32,
    ) -> Result<(), DispatchError> {
        self.workgroup_count = workgroup_layout(problem_size, workgroup_size)?;
        self.problem_size = problem_size;
        self.workgroup_size = workgroup_size;
        Ok(())
    }

    pub fn problem_size(&self) -> u32 {
        self.problem_size
    }

    pub fn workgroup_count(&self) -> u32 {
        self.workgroup_count
    }

    /// Queue one compute invocation over the configured workgroup count.
    /// Enqueue only; there is no completion signal.
    pub fn dispatch(&mut self) {
        self.commands.push(Command::Dispatch);
    }

    /// Queue a memory-visibility barrier. Required between dependent
    /// dispatches; a trailing barrier also orders the final dispatch against
    /// later render passes reading the same buffers.
    pub fn barrier(&mut self, _scope: BarrierScope) {
        self.commands.push(Command::Barrier);
    }

    /// Drain the queued commands into the encoder, one compute pass per
    /// barrier-delimited run of dispatches.
    pub fn encode(&mut self, encoder: &mut wgpu::CommandEncoder, bind_group: &wgpu::BindGroup) {
        debug_assert!(
            self.workgroup_count > 0,
            "dispatcher '{}' encoded before configure()",
            self.label
        );

        for run in pass_runs(&self.commands) {
            let mut pass = encoder.begin_compute_pass(&wgpu::ComputePassDescriptor {
                label: Some(&self.label),
                timestamp_writes: None,
            });
            pass.set_pipeline(&self.pipeline);
            pass.set_bind_group(0, bind_group, &[]);
            for _ in 0..run {
                pass.dispatch_workgroups(self.workgroup_count, 1, 1);
            }
        }
        self.commands.clear();
    }

    /// Number of queued commands awaiting [`encode`](Self::encode).
    pub fn pending_commands(&self) -> usize {
        self.commands.len()
    }
}

/// Workgroup count for a problem size: `ceil(problem_size / workgroup_size)`.
/// Zero for either size is a configuration error, fatal at setup.
fn workgroup_layout(problem_size: u32, workgroup_size: u32) -> Result<u32, DispatchError> {
    if problem_size == 0 || workgroup_size == 0 {
        return Err(DispatchError::InvalidSize {
            problem_size,
            workgroup_size,
        });
    }
    Ok(problem_size.div_ceil(workgroup_size))
}

/// Number of dispatches in each barrier-delimited run, in order.
/// One compute pass is encoded per run; runs of zero length are dropped.
fn pass_runs(commands: &[Command]) -> Vec<u32> {
    let mut runs = Vec::new();
    let mut current = 0u32;
    for cmd in commands {
        match cmd {
            Command::Dispatch => current += 1,
            Command::Barrier => {
                if current > 0 {
                    runs.push(current);
                    current = 0;
                }
            }
        }
    }
    if current > 0 {
        runs.push(current);
    }
    runs
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_workgroup_count_is_ceiling_division() {
        assert_eq!(workgroup_layout(100, WORKGROUP_SIZE).unwrap(), 2);
        assert_eq!(workgroup_layout(64, WORKGROUP_SIZE).unwrap(), 1);
        assert_eq!(workgroup_layout(65, WORKGROUP_SIZE).unwrap(), 2);
        assert_eq!(workgroup_layout(1, WORKGROUP_SIZE).unwrap(), 1);
        assert_eq!(workgroup_layout(6400, WORKGROUP_SIZE).unwrap(), 100);
    }

    #[test]
    fn test_zero_sizes_are_configuration_errors() {
        assert!(matches!(
            workgroup_layout(0, 64),
            Err(DispatchError::InvalidSize {
                problem_size: 0,
                workgroup_size: 64,
            })
        ));
        assert!(matches!(
            workgroup_layout(100, 0),
            Err(DispatchError::InvalidSize { .. })
        ));
    }

    #[test]
    fn test_barriers_split_dispatches_into_passes() {
        use Command::*;

        // The solver's substep pattern: N dispatch+barrier pairs
        let substeps: Vec<Command> = (0..20).flat_map(|_| [Dispatch, Barrier]).collect();
        assert_eq!(pass_runs(&substeps), vec![1; 20]);

        // Dispatches without barriers coalesce into one pass
        assert_eq!(pass_runs(&[Dispatch, Dispatch, Dispatch]), vec![3]);

        // Leading/double barriers do not produce empty passes
        assert_eq!(
            pass_runs(&[Barrier, Dispatch, Barrier, Barrier, Dispatch]),
            vec![1, 1]
        );

        assert_eq!(pass_runs(&[]), Vec::<u32>::new());
    }
}
