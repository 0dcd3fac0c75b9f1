//! Uncompressed 24-bit BMP images
//!
//! Files consist of a 14 byte file header, a 40 byte info header and the
//! pixel rows. Rows are stored bottom-up as BGR triples, each row padded
//! with zero bytes to a multiple of four bytes.

use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Seek, SeekFrom, Write};
use std::path::Path;
use std::str::FromStr;

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use tracing::debug;

use crate::error::{Error, Result};

/// "BM" read as a little-endian u16
pub const MAGIC: u16 = 0x4D42;
pub const FILE_HEADER_SIZE: u32 = 14;
pub const INFO_HEADER_SIZE: u32 = 40;
/// Pixel data starts right after both headers
pub const PIXEL_DATA_OFFSET: u32 = FILE_HEADER_SIZE + INFO_HEADER_SIZE;
pub const BITS_PER_PIXEL: u16 = 24;
/// 72 DPI
pub const PIXELS_PER_METER: i32 = 2835;

const BYTES_PER_PIXEL: u32 = 3;

/// Zero bytes appended to a row of `width` pixels
pub fn row_padding(width: u32) -> u32 {
    let row_bytes = u64::from(width) * u64::from(BYTES_PER_PIXEL);
    ((4 - row_bytes % 4) % 4) as u32
}

/// Serialized row length in bytes, padding included
fn row_stride(width: u32) -> u64 {
    u64::from(width) * u64::from(BYTES_PER_PIXEL) + u64::from(row_padding(width))
}

/// 24-bit color. Stored on disk in blue, green, red order.
#[derive(PartialEq, Eq, Hash, Clone, Copy, Debug, Default)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const WHITE: Rgb = Rgb::new(255, 255, 255);
    pub const BLACK: Rgb = Rgb::new(0, 0, 0);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    fn write_to<W: Write>(self, writer: &mut W) -> io::Result<()> {
        writer.write_all(&[self.b, self.g, self.r])
    }
}

/// Parse `#rrggbb`, `rrggbb` or `r,g,b`
impl FromStr for Rgb {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        let invalid = || Error::InvalidParameter(format!("invalid color `{s}`"));
        if s.contains(',') {
            let channels = s
                .split(',')
                .map(|c| c.trim().parse::<u8>().map_err(|_| invalid()))
                .collect::<Result<Vec<_>>>()?;
            return match channels[..] {
                [r, g, b] => Ok(Rgb::new(r, g, b)),
                _ => Err(invalid()),
            };
        }
        let hex = s.strip_prefix('#').unwrap_or(s);
        if hex.len() != 6 || !hex.is_ascii() {
            return Err(invalid());
        }
        let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).map_err(|_| invalid());
        Ok(Rgb::new(channel(0)?, channel(2)?, channel(4)?))
    }
}

/// BITMAPFILEHEADER
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
pub struct FileHeader {
    pub magic: u16,
    pub file_size: u32,
    pub reserved: [u16; 2],
    pub pixel_data_offset: u32,
}

impl FileHeader {
    pub fn write_to<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        writer.write_u16::<LittleEndian>(self.magic)?;
        writer.write_u32::<LittleEndian>(self.file_size)?;
        writer.write_u16::<LittleEndian>(self.reserved[0])?;
        writer.write_u16::<LittleEndian>(self.reserved[1])?;
        writer.write_u32::<LittleEndian>(self.pixel_data_offset)
    }

    pub fn read_from<R: Read>(reader: &mut R) -> io::Result<Self> {
        Ok(Self {
            magic: reader.read_u16::<LittleEndian>()?,
            file_size: reader.read_u32::<LittleEndian>()?,
            reserved: [
                reader.read_u16::<LittleEndian>()?,
                reader.read_u16::<LittleEndian>()?,
            ],
            pixel_data_offset: reader.read_u32::<LittleEndian>()?,
        })
    }
}

/// BITMAPINFOHEADER
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
pub struct InfoHeader {
    pub header_size: u32,
    pub width: i32,
    /// Positive for bottom-up rows, negative for top-down
    pub height: i32,
    pub color_planes: u16,
    pub bits_per_pixel: u16,
    pub compression: u32,
    pub image_size: u32,
    pub pixels_per_meter: (i32, i32),
    pub colors_used: u32,
    pub colors_important: u32,
}

impl InfoHeader {
    pub fn write_to<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        writer.write_u32::<LittleEndian>(self.header_size)?;
        writer.write_i32::<LittleEndian>(self.width)?;
        writer.write_i32::<LittleEndian>(self.height)?;
        writer.write_u16::<LittleEndian>(self.color_planes)?;
        writer.write_u16::<LittleEndian>(self.bits_per_pixel)?;
        writer.write_u32::<LittleEndian>(self.compression)?;
        writer.write_u32::<LittleEndian>(self.image_size)?;
        writer.write_i32::<LittleEndian>(self.pixels_per_meter.0)?;
        writer.write_i32::<LittleEndian>(self.pixels_per_meter.1)?;
        writer.write_u32::<LittleEndian>(self.colors_used)?;
        writer.write_u32::<LittleEndian>(self.colors_important)
    }

    pub fn read_from<R: Read>(reader: &mut R) -> io::Result<Self> {
        Ok(Self {
            header_size: reader.read_u32::<LittleEndian>()?,
            width: reader.read_i32::<LittleEndian>()?,
            height: reader.read_i32::<LittleEndian>()?,
            color_planes: reader.read_u16::<LittleEndian>()?,
            bits_per_pixel: reader.read_u16::<LittleEndian>()?,
            compression: reader.read_u32::<LittleEndian>()?,
            image_size: reader.read_u32::<LittleEndian>()?,
            pixels_per_meter: (
                reader.read_i32::<LittleEndian>()?,
                reader.read_i32::<LittleEndian>()?,
            ),
            colors_used: reader.read_u32::<LittleEndian>()?,
            colors_important: reader.read_u32::<LittleEndian>()?,
        })
    }
}

/// Pixel buffer, row-major from the top-left corner
#[derive(PartialEq, Eq, Clone, Debug)]
pub struct Image {
    width: u32,
    height: u32,
    pixels: Vec<Rgb>,
}

impl Image {
    /// Allocate a white image.
    ///
    /// Returns error if a dimension is zero or the file would not fit the
    /// header fields.
    pub fn new(width: u32, height: u32) -> Result<Self> {
        Self::check_dimensions(width, height)?;
        let len = width as usize * height as usize;
        let mut pixels = Vec::new();
        pixels.try_reserve_exact(len)?;
        pixels.resize(len, Rgb::WHITE);
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    fn check_dimensions(width: u32, height: u32) -> Result<()> {
        if width == 0 || height == 0 {
            return Err(Error::InvalidParameter(format!(
                "image dimensions must be positive, got {width}x{height}"
            )));
        }
        if i32::try_from(width).is_err() || i32::try_from(height).is_err() {
            return Err(Error::InvalidParameter(format!(
                "image {width}x{height} exceeds bitmap limits"
            )));
        }
        let file_size =
            u64::from(PIXEL_DATA_OFFSET) + row_stride(width) * u64::from(height);
        if file_size > u64::from(u32::MAX) {
            return Err(Error::InvalidParameter(format!(
                "image {width}x{height} exceeds the 4 GiB bitmap size limit"
            )));
        }
        Ok(())
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pixels(&self) -> &[Rgb] {
        &self.pixels
    }

    pub fn padding(&self) -> u32 {
        row_padding(self.width)
    }

    pub fn row_stride(&self) -> u32 {
        // Bounded by the file size check in Self::new
        row_stride(self.width) as u32
    }

    /// Pixel data size in bytes, padding included
    pub fn image_size(&self) -> u32 {
        self.row_stride() * self.height
    }

    pub fn file_size(&self) -> u32 {
        PIXEL_DATA_OFFSET + self.image_size()
    }

    pub fn file_header(&self) -> FileHeader {
        FileHeader {
            magic: MAGIC,
            file_size: self.file_size(),
            reserved: [0, 0],
            pixel_data_offset: PIXEL_DATA_OFFSET,
        }
    }

    pub fn info_header(&self) -> InfoHeader {
        InfoHeader {
            header_size: INFO_HEADER_SIZE,
            width: self.width as i32,
            height: self.height as i32,
            color_planes: 1,
            bits_per_pixel: BITS_PER_PIXEL,
            compression: 0,
            image_size: self.image_size(),
            pixels_per_meter: (PIXELS_PER_METER, PIXELS_PER_METER),
            colors_used: 0,
            colors_important: 0,
        }
    }

    fn offset(&self, x: i64, y: i64) -> Option<usize> {
        let x = u32::try_from(x).ok().filter(|x| *x < self.width)?;
        let y = u32::try_from(y).ok().filter(|y| *y < self.height)?;
        Some(y as usize * self.width as usize + x as usize)
    }

    /// Color at (x, y), `None` outside the image
    pub fn get_pixel(&self, x: i64, y: i64) -> Option<Rgb> {
        self.offset(x, y).map(|i| self.pixels[i])
    }

    /// Set the color at (x, y). Coordinates outside the image are ignored.
    pub fn set_pixel(&mut self, x: i64, y: i64, color: Rgb) {
        if let Some(i) = self.offset(x, y) {
            self.pixels[i] = color;
        }
    }

    pub fn fill(&mut self, color: Rgb) {
        self.pixels.fill(color);
    }

    /// Rows from the top, each `width` pixels long
    pub fn rows(&self) -> impl DoubleEndedIterator<Item = &[Rgb]> {
        self.pixels.chunks_exact(self.width as usize)
    }

    /// Write headers and bottom-up pixel rows
    pub fn encode<W: Write>(&self, writer: &mut W) -> Result<()> {
        self.file_header().write_to(writer)?;
        self.info_header().write_to(writer)?;

        let pad = [0u8; 3];
        let padding = self.padding() as usize;
        for row in self.rows().rev() {
            for pixel in row {
                pixel.write_to(writer)?;
            }
            writer.write_all(&pad[..padding])?;
        }
        Ok(())
    }

    /// Read a 24-bit uncompressed bitmap.
    ///
    /// Rows are bottom-up for a positive header height and top-down for a
    /// negative one; the returned image is always top-down.
    pub fn decode<R: Read + Seek>(reader: &mut R) -> Result<Self> {
        let file_header = FileHeader::read_from(reader)?;
        if file_header.magic != MAGIC {
            return Err(Error::Format(format!(
                "bad magic {:#06x}, expected {MAGIC:#06x}",
                file_header.magic
            )));
        }

        let info = InfoHeader::read_from(reader)?;
        if info.bits_per_pixel != BITS_PER_PIXEL {
            return Err(Error::Format(format!(
                "{} bits per pixel, only {BITS_PER_PIXEL} is supported",
                info.bits_per_pixel
            )));
        }
        if info.compression != 0 {
            return Err(Error::Format(format!(
                "compression method {} is not supported",
                info.compression
            )));
        }
        if info.width <= 0 || info.height == 0 {
            return Err(Error::Format(format!(
                "bad dimensions {}x{}",
                info.width, info.height
            )));
        }

        let width = info.width.unsigned_abs();
        let height = info.height.unsigned_abs();
        let top_down = info.height < 0;

        // Check the claimed pixel data against the stream before allocating
        let needed =
            u64::from(file_header.pixel_data_offset) + row_stride(width) * u64::from(height);
        let position = reader.stream_position()?;
        let available = reader.seek(SeekFrom::End(0))?;
        reader.seek(SeekFrom::Start(position))?;
        if needed > available {
            return Err(Error::Format(format!(
                "{width}x{height} image needs {needed} bytes, stream has {available}"
            )));
        }

        let mut image = Self::new(width, height).map_err(|e| match e {
            Error::InvalidParameter(msg) => Error::Format(msg),
            other => other,
        })?;
        debug!(width, height, top_down, "decoding bitmap");

        reader.seek(SeekFrom::Start(u64::from(file_header.pixel_data_offset)))?;
        let mut pad = [0u8; 3];
        let padding = &mut pad[..image.padding() as usize];
        let mut row_bytes = vec![0u8; width as usize * BYTES_PER_PIXEL as usize];
        for i in 0..height as usize {
            let y = if top_down { i } else { height as usize - 1 - i };
            reader.read_exact(&mut row_bytes)?;
            let start = y * width as usize;
            for (pixel, bgr) in image.pixels[start..start + width as usize]
                .iter_mut()
                .zip(row_bytes.chunks_exact(3))
            {
                *pixel = Rgb::new(bgr[2], bgr[1], bgr[0]);
            }
            reader.read_exact(padding)?;
        }
        Ok(image)
    }

    /// Write the image to `path`, replacing any existing file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let mut writer = BufWriter::new(File::create(path.as_ref())?);
        self.encode(&mut writer)?;
        writer.flush()?;
        debug!(path = %path.as_ref().display(), bytes = self.file_size(), "bitmap saved");
        Ok(())
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut reader = BufReader::new(File::open(path.as_ref())?);
        Self::decode(&mut reader)
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::io::{self, BufReader, Cursor, Read, Seek, SeekFrom};
    use std::rc::Rc;

    use super::{row_padding, Image, Rgb, MAGIC, PIXELS_PER_METER};
    use crate::Error;

    fn gradient(width: u32, height: u32) -> Image {
        let mut image = Image::new(width, height).unwrap();
        for y in 0..height {
            for x in 0..width {
                let color = Rgb::new((x * 40) as u8, (y * 40) as u8, (x + y) as u8);
                image.set_pixel(x.into(), y.into(), color);
            }
        }
        image
    }

    fn encoded(image: &Image) -> Vec<u8> {
        let mut bytes = vec![];
        image.encode(&mut bytes).unwrap();
        bytes
    }

    fn u16_at(bytes: &[u8], offset: usize) -> u16 {
        u16::from_le_bytes(bytes[offset..offset + 2].try_into().unwrap())
    }

    fn u32_at(bytes: &[u8], offset: usize) -> u32 {
        u32::from_le_bytes(bytes[offset..offset + 4].try_into().unwrap())
    }

    #[test]
    fn padding_formula() {
        let widths = [1, 2, 3, 4, 5, 16, 17];
        let expected = [1, 2, 3, 0, 1, 0, 1];
        for (w, p) in widths.into_iter().zip(expected) {
            assert_eq!(row_padding(w), p, "width {w}");
        }
    }

    #[test]
    fn new_image_is_white() {
        let image = Image::new(3, 2).unwrap();
        assert_eq!(image.pixels().len(), 6);
        assert!(image.pixels().iter().all(|p| *p == Rgb::WHITE));
    }

    #[test]
    fn reject_bad_dimensions() {
        assert!(matches!(Image::new(0, 5), Err(Error::InvalidParameter(_))));
        assert!(matches!(Image::new(5, 0), Err(Error::InvalidParameter(_))));
        assert!(matches!(
            Image::new(u32::MAX, 1),
            Err(Error::InvalidParameter(_))
        ));
        assert!(matches!(
            Image::new(40_000, 40_000),
            Err(Error::InvalidParameter(_))
        ));
    }

    #[test]
    fn out_of_range_pixels_are_ignored() {
        let mut image = Image::new(2, 2).unwrap();
        let before = image.clone();
        for (x, y) in [(-1, 0), (0, -1), (2, 0), (0, 2), (i64::MAX, 0)] {
            image.set_pixel(x, y, Rgb::BLACK);
            assert_eq!(image.get_pixel(x, y), None);
        }
        assert_eq!(image, before);

        image.set_pixel(1, 1, Rgb::BLACK);
        assert_eq!(image.get_pixel(1, 1), Some(Rgb::BLACK));
        assert_eq!(image.pixels()[3], Rgb::BLACK);
    }

    #[test]
    fn header_layout() {
        let image = gradient(5, 3);
        let bytes = encoded(&image);
        let stride = 5 * 3 + 1;

        assert_eq!(bytes.len(), 54 + stride * 3);
        assert_eq!(&bytes[0..2], b"BM");
        assert_eq!(u16_at(&bytes, 0), MAGIC);
        assert_eq!(u32_at(&bytes, 2), bytes.len() as u32);
        assert_eq!(u32_at(&bytes, 6), 0);
        assert_eq!(u32_at(&bytes, 10), 54);
        assert_eq!(u32_at(&bytes, 14), 40);
        assert_eq!(u32_at(&bytes, 18), 5);
        assert_eq!(u32_at(&bytes, 22), 3);
        assert_eq!(u16_at(&bytes, 26), 1);
        assert_eq!(u16_at(&bytes, 28), 24);
        assert_eq!(u32_at(&bytes, 30), 0);
        assert_eq!(u32_at(&bytes, 34), (stride * 3) as u32);
        assert_eq!(u32_at(&bytes, 38), PIXELS_PER_METER as u32);
        assert_eq!(u32_at(&bytes, 42), PIXELS_PER_METER as u32);
        assert_eq!(u32_at(&bytes, 46), 0);
        assert_eq!(u32_at(&bytes, 50), 0);
    }

    #[test]
    fn rows_are_bottom_up_bgr_with_padding() {
        let mut image = Image::new(1, 2).unwrap();
        image.set_pixel(0, 0, Rgb::new(1, 2, 3));
        image.set_pixel(0, 1, Rgb::new(4, 5, 6));
        let bytes = encoded(&image);

        // Bottom row first, then top row; one zero byte pads each row
        assert_eq!(&bytes[54..], &[6, 5, 4, 0, 3, 2, 1, 0]);
    }

    #[test]
    fn round_trip() {
        for (w, h) in [(1, 1), (3, 2), (4, 4), (5, 3), (16, 2), (17, 5)] {
            let image = gradient(w, h);
            let bytes = encoded(&image);
            assert_eq!(bytes.len() as u32, image.file_size());
            let decoded = Image::decode(&mut Cursor::new(bytes)).unwrap();
            assert_eq!(decoded, image, "{w}x{h}");
        }
    }

    #[test]
    fn decode_top_down_rows() {
        let image = gradient(3, 2);
        let mut bytes = encoded(&image);
        bytes[22..26].copy_from_slice(&(-2i32).to_le_bytes());
        // Swap the two serialized rows
        let stride = 3 * 3 + 3;
        let (first, second) = bytes[54..].split_at_mut(stride);
        first.swap_with_slice(second);

        let decoded = Image::decode(&mut Cursor::new(bytes)).unwrap();
        assert_eq!(decoded, image);
    }

    #[test]
    fn decode_honors_pixel_data_offset() {
        let image = gradient(2, 2);
        let bytes = encoded(&image);
        let mut shifted = bytes[..54].to_vec();
        shifted[10..14].copy_from_slice(&58u32.to_le_bytes());
        shifted.extend_from_slice(&[0xAA; 4]);
        shifted.extend_from_slice(&bytes[54..]);

        let decoded = Image::decode(&mut Cursor::new(shifted)).unwrap();
        assert_eq!(decoded, image);
    }

    #[test]
    fn reject_bad_magic() {
        let mut bytes = encoded(&gradient(2, 2));
        bytes[0] = b'X';
        let err = Image::decode(&mut Cursor::new(bytes)).unwrap_err();
        assert!(matches!(err, Error::Format(_)));
    }

    #[test]
    fn reject_unsupported_bit_depth() {
        let mut bytes = encoded(&gradient(2, 2));
        bytes[28..30].copy_from_slice(&32u16.to_le_bytes());
        let err = Image::decode(&mut Cursor::new(bytes)).unwrap_err();
        assert!(matches!(err, Error::Format(_)));
    }

    #[test]
    fn reject_compressed() {
        let mut bytes = encoded(&gradient(2, 2));
        bytes[30..34].copy_from_slice(&1u32.to_le_bytes());
        let err = Image::decode(&mut Cursor::new(bytes)).unwrap_err();
        assert!(matches!(err, Error::Format(_)));
    }

    #[test]
    fn reject_non_positive_width() {
        let mut bytes = encoded(&gradient(2, 2));
        bytes[18..22].copy_from_slice(&(-2i32).to_le_bytes());
        let err = Image::decode(&mut Cursor::new(bytes)).unwrap_err();
        assert!(matches!(err, Error::Format(_)));
    }

    #[test]
    fn truncated_headers_are_io_error() {
        let bytes = encoded(&gradient(4, 4));
        for len in [10, 40] {
            let err = Image::decode(&mut Cursor::new(&bytes[..len])).unwrap_err();
            assert!(matches!(err, Error::Io(_)), "length {len}");
        }
    }

    #[test]
    fn truncated_pixel_data_is_rejected() {
        let bytes = encoded(&gradient(4, 4));
        for len in [54, 60, bytes.len() - 1] {
            let err = Image::decode(&mut Cursor::new(&bytes[..len])).unwrap_err();
            assert!(matches!(err, Error::Format(_)), "length {len}");
        }
    }

    #[test]
    fn reject_dimensions_larger_than_stream() {
        // Headers claim 20000x20000 but only four pixel bytes follow
        let mut bytes = encoded(&gradient(1, 1));
        bytes[18..22].copy_from_slice(&20_000i32.to_le_bytes());
        bytes[22..26].copy_from_slice(&20_000i32.to_le_bytes());
        assert_eq!(bytes.len(), 58);
        let err = Image::decode(&mut Cursor::new(bytes)).unwrap_err();
        assert!(matches!(err, Error::Format(_)));
    }

    /// Reader counting calls to `seek`
    struct SeekCounter<R> {
        inner: R,
        seeks: Rc<Cell<usize>>,
    }

    impl<R: Read> Read for SeekCounter<R> {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            self.inner.read(buf)
        }
    }

    impl<R: Seek> Seek for SeekCounter<R> {
        fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
            self.seeks.set(self.seeks.get() + 1);
            self.inner.seek(pos)
        }
    }

    #[test]
    fn buffered_decode_does_not_seek_per_row() {
        let image = gradient(5, 100);
        let seeks = Rc::new(Cell::new(0));
        let mut reader = BufReader::new(SeekCounter {
            inner: Cursor::new(encoded(&image)),
            seeks: Rc::clone(&seeks),
        });
        let decoded = Image::decode(&mut reader).unwrap();
        assert_eq!(decoded, image);
        assert!(seeks.get() <= 4, "{} seeks", seeks.get());
    }

    #[test]
    fn save_and_load_file() {
        let path = std::env::temp_dir().join(format!("maze-bmp-test-{}.bmp", std::process::id()));
        let image = gradient(7, 3);
        image.save(&path).unwrap();
        assert_eq!(
            std::fs::metadata(&path).unwrap().len(),
            u64::from(image.file_size())
        );
        let loaded = Image::load(&path).unwrap();
        std::fs::remove_file(&path).unwrap();
        assert_eq!(loaded, image);
    }

    #[test]
    fn load_missing_file() {
        let err = Image::load("/nonexistent/dir/maze.bmp").unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn parse_colors() {
        assert_eq!("#ff8000".parse::<Rgb>().unwrap(), Rgb::new(255, 128, 0));
        assert_eq!("0A0b0C".parse::<Rgb>().unwrap(), Rgb::new(10, 11, 12));
        assert_eq!("200, 100,0".parse::<Rgb>().unwrap(), Rgb::new(200, 100, 0));
        for bad in ["", "#fff", "1,2", "1,2,300", "#gg0000", "#ff80001"] {
            assert!(bad.parse::<Rgb>().is_err(), "{bad}");
        }
    }
}
