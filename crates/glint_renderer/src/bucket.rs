//! Bucket-based scatter/gather over the image.
//!
//! Divides the image into tiles (buckets) that are processed independently
//! on the render pool and reassembled into a row-major buffer.

use rayon::prelude::*;

/// A rectangular region of the image.
#[derive(Debug, Clone, Copy)]
pub struct Bucket {
    /// X coordinate of bucket's top-left corner
    pub x: u32,
    /// Y coordinate of bucket's top-left corner
    pub y: u32,
    /// Width of the bucket in pixels
    pub width: u32,
    /// Height of the bucket in pixels
    pub height: u32,
    /// Index of this bucket in the processing order
    pub index: usize,
}

impl Bucket {
    pub fn new(x: u32, y: u32, width: u32, height: u32, index: usize) -> Self {
        Self {
            x,
            y,
            width,
            height,
            index,
        }
    }

    /// Global pixel coordinates, row-major within the bucket.
    pub fn pixels(&self) -> impl Iterator<Item = (u32, u32)> + '_ {
        (0..self.height).flat_map(move |ly| (0..self.width).map(move |lx| (self.x + lx, self.y + ly)))
    }
}

/// Default bucket size in pixels.
pub const DEFAULT_BUCKET_SIZE: u32 = 32;

/// Generate buckets for an image, sorted in spiral order from center.
pub fn generate_buckets(width: u32, height: u32, bucket_size: u32) -> Vec<Bucket> {
    let bucket_size = bucket_size.max(1);
    let mut buckets = Vec::new();
    let mut index = 0;

    let mut y = 0;
    while y < height {
        let mut x = 0;
        while x < width {
            let bw = bucket_size.min(width - x);
            let bh = bucket_size.min(height - y);
            buckets.push(Bucket::new(x, y, bw, bh, index));
            index += 1;
            x += bucket_size;
        }
        y += bucket_size;
    }

    sort_spiral(&mut buckets, width, height);

    for (i, bucket) in buckets.iter_mut().enumerate() {
        bucket.index = i;
    }

    buckets
}

/// Sort buckets by distance from image center.
fn sort_spiral(buckets: &mut [Bucket], width: u32, height: u32) {
    let center_x = width as f64 / 2.0;
    let center_y = height as f64 / 2.0;
    let distance = |b: &Bucket| {
        let bx = b.x as f64 + b.width as f64 / 2.0;
        let by = b.y as f64 + b.height as f64 / 2.0;
        (bx - center_x).powi(2) + (by - center_y).powi(2)
    };

    buckets.sort_by(|a, b| {
        distance(a)
            .partial_cmp(&distance(b))
            .unwrap_or(std::cmp::Ordering::Equal)
    });
}

/// Values computed for one bucket, row-major.
#[derive(Debug, Clone)]
pub struct BucketResult<T> {
    pub bucket: Bucket,
    pub pixels: Vec<T>,
}

impl<T> BucketResult<T> {
    pub fn new(bucket: Bucket, pixels: Vec<T>) -> Self {
        Self { bucket, pixels }
    }
}

/// Evaluate `per_pixel` for every pixel of a `width` x `height` image on
/// `pool`, one task per bucket, and gather the results row-major.
pub fn render_buckets<T, F>(pool: &rayon::ThreadPool, width: u32, height: u32, per_pixel: F) -> Vec<T>
where
    T: Send + Clone + Default,
    F: Fn(u32, u32) -> T + Sync,
{
    let buckets = generate_buckets(width, height, DEFAULT_BUCKET_SIZE);

    let results: Vec<BucketResult<T>> = pool.install(|| {
        buckets
            .par_iter()
            .map(|bucket| {
                let pixels = bucket.pixels().map(|(x, y)| per_pixel(x, y)).collect();
                BucketResult::new(*bucket, pixels)
            })
            .collect()
    });

    let mut image = vec![T::default(); width as usize * height as usize];
    for result in results {
        for ((x, y), value) in result.bucket.pixels().zip(result.pixels) {
            image[y as usize * width as usize + x as usize] = value;
        }
    }
    image
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_buckets_exact_fit() {
        let buckets = generate_buckets(128, 128, 64);
        assert_eq!(buckets.len(), 4); // 2x2 grid

        let total_pixels: u32 = buckets.iter().map(|b| b.width * b.height).sum();
        assert_eq!(total_pixels, 128 * 128);
    }

    #[test]
    fn test_generate_buckets_partial_fit() {
        let buckets = generate_buckets(100, 100, 64);
        assert_eq!(buckets.len(), 4); // 2x2 grid with partial buckets

        let total_pixels: u32 = buckets.iter().map(|b| b.width * b.height).sum();
        assert_eq!(total_pixels, 100 * 100);
    }

    #[test]
    fn test_spiral_order() {
        let buckets = generate_buckets(192, 192, 64);
        assert_eq!(buckets.len(), 9); // 3x3 grid

        // First bucket should be the center one
        let first = &buckets[0];
        assert_eq!(first.x, 64);
        assert_eq!(first.y, 64);
    }

    #[test]
    fn test_bucket_pixels() {
        let bucket = Bucket::new(4, 6, 2, 2, 0);
        let pixels: Vec<_> = bucket.pixels().collect();
        assert_eq!(pixels, vec![(4, 6), (5, 6), (4, 7), (5, 7)]);
    }

    #[test]
    fn test_render_buckets_gathers_row_major() {
        let pool = rayon::ThreadPoolBuilder::new().num_threads(3).build().unwrap();
        let (w, h) = (70, 45);
        let image = render_buckets(&pool, w, h, |x, y| (x, y));

        assert_eq!(image.len(), (w * h) as usize);
        for (i, &(x, y)) in image.iter().enumerate() {
            assert_eq!(i, (y * w + x) as usize);
        }
    }
}
