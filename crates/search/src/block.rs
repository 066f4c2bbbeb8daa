//! In-process search: greedily groups contiguous source windows whose
//! destinations also form a contiguous block into single vector permutes.

use crate::error::SearchError;
use crate::SearchTool;
use permforge_kernels::TargetFamily;
use permforge_patterns::{join_csv, Pattern};
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum PermuteBlock {
    /// `out[destination] = in[source]`.
    Move { source: usize, destination: usize },
    /// Lanes `in[source..source + n]` permuted into `out[destination..destination + n]`;
    /// output lane `l` takes input lane `control[l]`.
    Vector {
        source: usize,
        destination: usize,
        control: Vec<usize>,
    },
}

impl PermuteBlock {
    pub fn lanes(&self) -> usize {
        match self {
            PermuteBlock::Move { .. } => 1,
            PermuteBlock::Vector { control, .. } => control.len(),
        }
    }
}

/// Split a pattern into blocks, widest first, scanning sources left to right.
pub fn plan_blocks(pattern: &Pattern, family: TargetFamily) -> Vec<PermuteBlock> {
    let destinations = pattern.destinations();
    let widths: &[usize] = match family.max_lanes() {
        8 => &[8, 4],
        _ => &[4],
    };

    let mut blocks = Vec::new();
    let mut source = 0;
    'scan: while source < destinations.len() {
        for &width in widths {
            if let Some(block) = vector_block(destinations, source, width) {
                blocks.push(block);
                source += width;
                continue 'scan;
            }
        }
        blocks.push(PermuteBlock::Move {
            source,
            destination: destinations[source],
        });
        source += 1;
    }
    blocks
}

fn vector_block(destinations: &[usize], source: usize, width: usize) -> Option<PermuteBlock> {
    let window = destinations.get(source..source + width)?;
    let base = *window.iter().min()?;
    let top = *window.iter().max()?;
    // Destinations are distinct, so a span of `width` means a full block.
    if top - base != width - 1 {
        return None;
    }
    let mut control = vec![0; width];
    for (lane, &destination) in window.iter().enumerate() {
        control[destination - base] = lane;
    }
    Some(PermuteBlock::Vector {
        source,
        destination: base,
        control,
    })
}

/// Render blocks as C statements for `family`.
pub fn encode_blocks(blocks: &[PermuteBlock], family: TargetFamily) -> String {
    let mut code = String::new();
    for (index, block) in blocks.iter().enumerate() {
        match block {
            PermuteBlock::Move {
                source,
                destination,
            } => {
                let _ = writeln!(code, "out[{destination}] = in[{source}];");
            }
            PermuteBlock::Vector {
                source,
                destination,
                control,
            } => encode_vector(&mut code, index, *source, *destination, control, family),
        }
    }
    code
}

fn encode_vector(
    code: &mut String,
    index: usize,
    source: usize,
    destination: usize,
    control: &[usize],
    family: TargetFamily,
) {
    match (family, control.len()) {
        (TargetFamily::Avx2, 8) => {
            let _ = writeln!(code, "{{");
            let _ = writeln!(code, "    __m256 v{index} = _mm256_loadu_ps(&in[{source}]);");
            let _ = writeln!(
                code,
                "    __m256i c{index} = _mm256_setr_epi32({});",
                join_csv(control)
            );
            let _ = writeln!(
                code,
                "    _mm256_storeu_ps(&out[{destination}], _mm256_permutevar8x32_ps(v{index}, c{index}));"
            );
            let _ = writeln!(code, "}}");
        }
        (TargetFamily::Avx2, _) => {
            let imm = control
                .iter()
                .enumerate()
                .fold(0usize, |imm, (lane, &from)| imm | (from << (2 * lane)));
            let _ = writeln!(code, "{{");
            let _ = writeln!(code, "    __m128 v{index} = _mm_loadu_ps(&in[{source}]);");
            let _ = writeln!(
                code,
                "    _mm_storeu_ps(&out[{destination}], _mm_permute_ps(v{index}, {imm}));"
            );
            let _ = writeln!(code, "}}");
        }
        (TargetFamily::Neon, _) => {
            let bytes: Vec<usize> = control
                .iter()
                .flat_map(|&from| (0..4).map(move |byte| from * 4 + byte))
                .collect();
            let _ = writeln!(code, "{{");
            let _ = writeln!(
                code,
                "    const uint8_t t{index}[16] = {{{}}};",
                join_csv(&bytes)
            );
            let _ = writeln!(code, "    float32x4_t v{index} = vld1q_f32(&in[{source}]);");
            let _ = writeln!(
                code,
                "    uint8x16_t p{index} = vqtbl1q_u8(vreinterpretq_u8_f32(v{index}), vld1q_u8(t{index}));"
            );
            let _ = writeln!(
                code,
                "    vst1q_f32(&out[{destination}], vreinterpretq_f32_u8(p{index}));"
            );
            let _ = writeln!(code, "}}");
        }
    }
}

/// [`SearchTool`] that plans blocks without spawning a process.
#[derive(Debug, Clone, Copy, Default)]
pub struct BlockSearch;

impl BlockSearch {
    pub fn new() -> Self {
        Self
    }
}

impl SearchTool for BlockSearch {
    fn name(&self) -> &str {
        "block"
    }

    fn search(&self, pattern: &Pattern, family: TargetFamily) -> Result<String, SearchError> {
        let blocks = plan_blocks(pattern, family);
        let vectors = blocks.iter().filter(|b| b.lanes() > 1).count();
        debug!(
            arg_count = pattern.arg_count(),
            family = %family,
            blocks = blocks.len(),
            vectors,
            "planned permutation blocks"
        );
        Ok(encode_blocks(&blocks, family))
    }
}
