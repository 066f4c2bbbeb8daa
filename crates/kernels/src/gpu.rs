//! CUDA backend: one thread per element, destinations held in constant
//! memory.

use crate::backend::{KernelBackend, RenderContext};
use crate::config::{BackendDescriptor, BackendKind, ComputeUnit, ElementType};
use crate::error::BackendError;
use crate::utils;
use permforge_patterns::join_csv;

const THREADS_PER_BLOCK: usize = 256;

const NVCC_CUDA: BackendDescriptor = BackendDescriptor {
    name: "cuda",
    aliases: &["cuda2"],
    kind: BackendKind::Gpu,
    compiler_prefix: &["nvcc", "-O3"],
    program_output: "prog.cu",
    openmp_flags: &["-Xcompiler", "-fopenmp"],
    assembly_flag: "-ptx",
    assembly_extension: "ptx",
    element: ElementType::Int,
    compute_unit: ComputeUnit::Nanoseconds,
};

pub struct GpuBackend {
    descriptor: BackendDescriptor,
}

impl GpuBackend {
    pub fn cuda() -> Self {
        Self {
            descriptor: NVCC_CUDA,
        }
    }
}

impl KernelBackend for GpuBackend {
    fn descriptor(&self) -> &BackendDescriptor {
        &self.descriptor
    }

    fn render(&self, ctx: &RenderContext<'_>) -> Result<String, BackendError> {
        let pattern = ctx.pattern;
        let arg_count = pattern.arg_count();
        let element = self.descriptor.element;

        let mut lines = utils::includes(&["cuda_runtime.h"]);
        lines.extend(utils::constants(arg_count, pattern.probe()));
        lines.push(format!(
            "__device__ __constant__ int mask[{arg_count}] = {{{}}};",
            join_csv(pattern.destinations())
        ));
        lines.push(String::new());
        lines.extend(utils::helpers(element));

        lines.extend([
            "__global__ void permute_array(const int *in, int *out) {".to_string(),
            "    unsigned int index = blockDim.x * blockIdx.x + threadIdx.x;".to_string(),
            "    if (index < arg_count) {".to_string(),
            "        out[mask[index]] = in[index];".to_string(),
            "    }".to_string(),
            "}".to_string(),
            String::new(),
        ]);

        lines.extend(utils::main_prologue(element, "__host__"));
        lines.extend([
            "    int *input_gpu = NULL;".to_string(),
            "    int *output_gpu = NULL;".to_string(),
            "    cudaMalloc((void **) &input_gpu, arg_count * sizeof(int));".to_string(),
            "    cudaMalloc((void **) &output_gpu, arg_count * sizeof(int));".to_string(),
            "    cudaMemcpy(input_gpu, input, arg_count * sizeof(int), cudaMemcpyHostToDevice);"
                .to_string(),
            String::new(),
            "    cudaEvent_t start, stop;".to_string(),
            "    cudaEventCreate(&start);".to_string(),
            "    cudaEventCreate(&stop);".to_string(),
            "    cudaEventRecord(start);".to_string(),
            format!(
                "    permute_array<<<(arg_count + {tpb} - 1) / {tpb}, {tpb}>>>(input_gpu, output_gpu);",
                tpb = THREADS_PER_BLOCK
            ),
            "    cudaEventRecord(stop);".to_string(),
            "    cudaEventSynchronize(stop);".to_string(),
            "    if (cudaGetLastError() != cudaSuccess) {".to_string(),
            "        fail(\"kernel launch failed\");".to_string(),
            "    }".to_string(),
            "    float milliseconds = -1;".to_string(),
            "    cudaEventElapsedTime(&milliseconds, start, stop);".to_string(),
            String::new(),
            "    cudaMemcpy(output, output_gpu, arg_count * sizeof(int), cudaMemcpyDeviceToHost);"
                .to_string(),
            "    cudaFree(input_gpu);".to_string(),
            "    cudaFree(output_gpu);".to_string(),
            String::new(),
        ]);
        lines.extend(utils::main_epilogue(
            element,
            "%lld",
            "(long long) (milliseconds * 1000000.0f)",
        ));
        Ok(utils::join_lines(lines))
    }
}
