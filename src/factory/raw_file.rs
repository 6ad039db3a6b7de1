use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Read, Seek, SeekFrom, Write};
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

use tracing::{debug, trace};

use crate::error::FactoryError;
use crate::geometry::{Domain, Point};
use crate::image::{DenseImage, Image};

use super::{check_sub_domain, ImageFactory, Sample};

/// Factory backed by a headerless raw file of little-endian samples.
///
/// The file stores the full domain in the same order as [`DenseImage`]:
/// axis 0 fastest. A tile is read or written one axis-0 row at a time, so
/// each row costs one seek and one contiguous transfer.
///
/// # Example
///
/// ```no_run
/// use tiled_image::factory::{ImageFactory, RawFileImageFactory};
/// use tiled_image::geometry::{Domain, Point};
///
/// let domain = Domain::new(Point::new([0, 0]), Point::new([4095, 4095])).unwrap();
/// let mut factory = RawFileImageFactory::<u16, 2>::open("scan.raw", domain).unwrap();
///
/// let tile_domain = Domain::new(Point::new([0, 0]), Point::new([255, 255])).unwrap();
/// let tile = factory.request_image(&tile_domain).unwrap();
/// ```
#[derive(Debug)]
pub struct RawFileImageFactory<V, const D: usize> {
    path: PathBuf,
    file: File,
    domain: Domain<D>,
    _sample: PhantomData<V>,
}

impl<V: Sample, const D: usize> RawFileImageFactory<V, D> {
    /// Open an existing raw file for reading and writing.
    ///
    /// The file length must be exactly `domain.size() * V::SIZE` bytes.
    pub fn open(path: impl AsRef<Path>, domain: Domain<D>) -> Result<Self, FactoryError> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new().read(true).write(true).open(&path)?;

        let expected = domain.size() * V::SIZE as u64;
        let actual = file.metadata()?.len();
        if actual != expected {
            return Err(FactoryError::SizeMismatch { expected, actual });
        }

        debug!(path = %path.display(), %domain, "opened raw image");
        Ok(Self {
            path,
            file,
            domain,
            _sample: PhantomData,
        })
    }

    /// Create (or truncate) a raw file covering `domain`, every sample set
    /// to `fill`.
    pub fn create(path: impl AsRef<Path>, domain: Domain<D>, fill: V) -> Result<Self, FactoryError> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(&path)?;

        let row_len = domain.extent()[0] as usize;
        let mut row = vec![0u8; row_len * V::SIZE];
        for chunk in row.chunks_exact_mut(V::SIZE) {
            fill.write_le(chunk);
        }

        let rows = domain.size() / row_len as u64;
        let mut writer = BufWriter::new(&file);
        for _ in 0..rows {
            writer.write_all(&row)?;
        }
        writer.flush()?;
        drop(writer);

        debug!(path = %path.display(), %domain, "created raw image");
        Ok(Self {
            path,
            file,
            domain,
            _sample: PhantomData,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Byte offset of `point` in the file.
    fn offset_of(&self, point: &Point<D>) -> u64 {
        self.domain.linear_index(point) as u64 * V::SIZE as u64
    }

    /// Start of every axis-0 row of `sub_domain`, in the tile's linear order.
    fn row_starts(sub_domain: &Domain<D>) -> impl Iterator<Item = Point<D>> {
        let mut last = *sub_domain.upper_bound();
        last[0] = sub_domain.lower_bound()[0];
        // lower <= last on every axis because sub_domain is a valid domain.
        Domain::new(*sub_domain.lower_bound(), last)
            .map(|rows| rows.points())
            .into_iter()
            .flatten()
    }
}

impl<V: Sample, const D: usize> ImageFactory<D> for RawFileImageFactory<V, D> {
    type Output = DenseImage<V, D>;

    fn domain(&self) -> &Domain<D> {
        &self.domain
    }

    fn is_valid(&self) -> bool {
        self.file
            .metadata()
            .map(|m| m.len() == self.domain.size() * V::SIZE as u64)
            .unwrap_or(false)
    }

    fn request_image(&mut self, sub_domain: &Domain<D>) -> Result<Self::Output, FactoryError> {
        check_sub_domain(&self.domain, sub_domain)?;
        trace!(tile = %sub_domain, "reading tile from raw file");

        let row_len = sub_domain.extent()[0] as usize;
        let mut row = vec![0u8; row_len * V::SIZE];
        let mut data = Vec::with_capacity(sub_domain.size() as usize);

        for start in Self::row_starts(sub_domain) {
            self.file.seek(SeekFrom::Start(self.offset_of(&start)))?;
            self.file.read_exact(&mut row)?;
            data.extend(row.chunks_exact(V::SIZE).map(V::read_le));
        }

        DenseImage::from_vec(*sub_domain, data).ok_or_else(|| {
            FactoryError::Io(format!("short read for tile {}", sub_domain))
        })
    }

    fn flush_image(&mut self, tile: &Self::Output) -> Result<(), FactoryError> {
        let sub_domain = *tile.domain();
        check_sub_domain(&self.domain, &sub_domain)?;
        trace!(tile = %sub_domain, "writing tile to raw file");

        let row_len = sub_domain.extent()[0] as usize;
        let mut row = vec![0u8; row_len * V::SIZE];

        for (start, samples) in Self::row_starts(&sub_domain).zip(tile.as_slice().chunks(row_len)) {
            for (value, out) in samples.iter().zip(row.chunks_exact_mut(V::SIZE)) {
                value.write_le(out);
            }
            self.file.seek(SeekFrom::Start(self.offset_of(&start)))?;
            self.file.write_all(&row)?;
        }
        self.file.flush()?;
        Ok(())
    }
}
