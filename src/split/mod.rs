/*!
# Splitters

Random partitions of row indices into train, validation and test sets:
- [`StratifiedSplit`] splits by proportions (optionally preserving the class proportions of
  a label array) and applies the partition to any number of equally long arrays,
- [`balanced_split`] draws a fixed number of training and validation nodes per class.

Both return an [`IndexPartition`], which can be applied to everything implementing
[`RowSelect`] (slices, `ndarray` matrices and [`CsrMatrix`](crate::sparse::CsrMatrix)).

# Randomness
Every splitter takes an optional seed. With a seed the result is reproducible across calls
and platforms (the generator is a seeded [`Pcg64Mcg`]). Without a seed, the generator is
seeded from the thread-local OS-seeded [`rand::rng`], so successive calls return different
partitions.
*/

mod apportion;
mod balanced;
mod partition;
mod stratified;

pub use balanced::*;
pub use partition::*;
pub use stratified::*;

use rand::SeedableRng;
use rand_pcg::Pcg64Mcg;

/// Returns a generator seeded with `seed` or, if absent, from the thread-local generator
pub(crate) fn rng_from_seed(seed: Option<u64>) -> Pcg64Mcg {
    match seed {
        Some(seed) => Pcg64Mcg::seed_from_u64(seed),
        None => Pcg64Mcg::from_rng(&mut rand::rng()),
    }
}
