use std::fs::{self, File, OpenOptions};
use std::io::{Seek, SeekFrom, Write};

use camino::{Utf8Path, Utf8PathBuf};

use crate::config::DisplayConfig;
use crate::device::Display;
use crate::error::{CalError, CalResult};
use crate::types::Rgb8;

#[derive(Copy, Debug, Clone, PartialEq, Eq)]
pub struct Geometry {
    pub width: u32,
    pub height: u32,
    pub bits_per_pixel: u32,
    /// Bytes per line, including padding.
    pub stride: u32,
}

impl Geometry {
    /// Fill in whatever `conf` leaves open from sysfs.
    pub fn discover(conf: &DisplayConfig) -> CalResult<Self> {
        if let (Some(width), Some(height), Some(bits_per_pixel), Some(stride)) =
            (conf.width, conf.height, conf.bits_per_pixel, conf.stride)
        {
            return Ok(Self {
                width,
                height,
                bits_per_pixel,
                stride,
            });
        }

        let sysfs = sysfs_dir(&conf.device)?;
        log::debug!("Reading framebuffer geometry from [{sysfs}]");

        let (width, height) = match (conf.width, conf.height) {
            (Some(w), Some(h)) => (w, h),
            (w, h) => {
                let (sw, sh) = parse_size(&read_attr(&sysfs, "virtual_size")?)?;
                (w.unwrap_or(sw), h.unwrap_or(sh))
            }
        };

        let bits_per_pixel = match conf.bits_per_pixel {
            Some(bpp) => bpp,
            None => parse_number(&read_attr(&sysfs, "bits_per_pixel")?)?,
        };

        let stride = match conf.stride {
            Some(stride) => stride,
            None => parse_number(&read_attr(&sysfs, "stride")?)?,
        };

        Ok(Self {
            width,
            height,
            bits_per_pixel,
            stride,
        })
    }

    const fn bytes_per_pixel(&self) -> usize {
        (self.bits_per_pixel / 8) as usize
    }
}

fn sysfs_dir(device: &Utf8Path) -> CalResult<Utf8PathBuf> {
    let name = device
        .file_name()
        .ok_or_else(|| CalError::Geometry(format!("no device name in [{device}]")))?;
    Ok(Utf8PathBuf::from("/sys/class/graphics").join(name))
}

fn read_attr(dir: &Utf8Path, attr: &str) -> CalResult<String> {
    let path = dir.join(attr);
    fs::read_to_string(&path).map_err(|e| CalError::Geometry(format!("[{path}]: {e}")))
}

fn parse_number(text: &str) -> CalResult<u32> {
    text.trim()
        .parse()
        .map_err(|_| CalError::Geometry(format!("not a number: {text:?}")))
}

/// Parse sysfs `virtual_size`, formatted as `width,height`.
fn parse_size(text: &str) -> CalResult<(u32, u32)> {
    let (w, h) = text
        .trim()
        .split_once(',')
        .ok_or_else(|| CalError::Geometry(format!("bad size: {text:?}")))?;
    Ok((parse_number(w)?, parse_number(h)?))
}

/// Encode one pixel in the framebuffer's native byte order.
fn encode_pixel(bits_per_pixel: u32, color: Rgb8, alpha: u8) -> CalResult<Vec<u8>> {
    let Rgb8 { r, g, b } = color;
    match bits_per_pixel {
        32 => Ok(vec![b, g, r, alpha]),
        24 => Ok(vec![b, g, r]),
        16 => {
            let packed =
                (u16::from(r >> 3) << 11) | (u16::from(g >> 2) << 5) | u16::from(b >> 3);
            Ok(packed.to_le_bytes().to_vec())
        }
        bpp => Err(CalError::UnsupportedPixelFormat(bpp)),
    }
}

/// A Linux framebuffer device, painted by writing whole frames.
pub struct Framebuffer {
    file: File,
    geometry: Geometry,
    alpha: u8,
    frame: Vec<u8>,
}

impl Framebuffer {
    pub fn open(conf: &DisplayConfig) -> CalResult<Self> {
        let geometry = Geometry::discover(conf)?;
        let file = OpenOptions::new()
            .write(true)
            .open(&conf.device)
            .map_err(|e| CalError::FramebufferOpen(conf.device.clone(), e))?;

        log::info!(
            "Opened framebuffer [{}]: {}x{} at {} bpp",
            conf.device,
            geometry.width,
            geometry.height,
            geometry.bits_per_pixel
        );

        Self::with_file(file, geometry, conf.alpha)
    }

    pub fn with_file(file: File, geometry: Geometry, alpha: u8) -> CalResult<Self> {
        /* reject unsupported formats before the first paint */
        encode_pixel(geometry.bits_per_pixel, Rgb8::WHITE, alpha)?;

        let row = geometry.width as usize * geometry.bytes_per_pixel();
        if geometry.stride == 0 || (geometry.stride as usize) < row {
            return Err(CalError::Geometry(format!(
                "stride {} shorter than a row of {row} bytes",
                geometry.stride
            )));
        }

        Ok(Self {
            file,
            geometry,
            alpha,
            frame: vec![0; geometry.stride as usize * geometry.height as usize],
        })
    }

    #[must_use]
    pub const fn geometry(&self) -> &Geometry {
        &self.geometry
    }
}

impl Display for Framebuffer {
    fn paint(&mut self, color: Rgb8) -> CalResult<()> {
        let pixel = encode_pixel(self.geometry.bits_per_pixel, color, self.alpha)?;
        let row = self.geometry.width as usize * pixel.len();

        for line in self.frame.chunks_exact_mut(self.geometry.stride as usize) {
            for px in line[..row].chunks_exact_mut(pixel.len()) {
                px.copy_from_slice(&pixel);
            }
        }

        self.file.seek(SeekFrom::Start(0))?;
        self.file.write_all(&self.frame)?;
        self.file.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::io::Read;

    use super::*;

    fn conf(device: Utf8PathBuf) -> DisplayConfig {
        DisplayConfig {
            device,
            alpha: 255,
            width: Some(3),
            height: Some(2),
            bits_per_pixel: Some(32),
            stride: Some(16),
        }
    }

    #[test]
    fn encodes_supported_formats() {
        let c = Rgb8::new(0x12, 0x34, 0x56);
        assert_eq!(encode_pixel(32, c, 0xff).unwrap(), vec![0x56, 0x34, 0x12, 0xff]);
        assert_eq!(encode_pixel(24, c, 0xff).unwrap(), vec![0x56, 0x34, 0x12]);
        assert_eq!(encode_pixel(16, Rgb8::WHITE, 0xff).unwrap(), vec![0xff, 0xff]);
        assert_eq!(
            encode_pixel(16, Rgb8::new(255, 0, 0), 0xff).unwrap(),
            0xf800u16.to_le_bytes().to_vec()
        );
        assert!(matches!(
            encode_pixel(8, c, 0xff),
            Err(CalError::UnsupportedPixelFormat(8))
        ));
    }

    #[test]
    fn parses_sysfs_attributes() {
        assert_eq!(parse_size("1920,1080\n").unwrap(), (1920, 1080));
        assert_eq!(parse_number(" 32\n").unwrap(), 32);
        assert!(parse_size("1920x1080").is_err());
    }

    #[test]
    fn configured_geometry_skips_sysfs() {
        let geometry = Geometry::discover(&conf(Utf8PathBuf::from("/nonexistent/fb9"))).unwrap();
        assert_eq!(
            geometry,
            Geometry {
                width: 3,
                height: 2,
                bits_per_pixel: 32,
                stride: 16,
            }
        );
    }

    #[test]
    fn paints_whole_frame_and_keeps_padding() {
        let tmp = tempfile::NamedTempFile::new().unwrap();
        let device = Utf8PathBuf::from_path_buf(tmp.path().to_path_buf()).unwrap();

        let mut fb = Framebuffer::open(&conf(device)).unwrap();
        assert_eq!(fb.geometry().stride, 16);
        fb.paint(Rgb8::new(1, 2, 3)).unwrap();
        fb.paint(Rgb8::new(10, 20, 30)).unwrap();

        let mut data = vec![];
        File::open(tmp.path()).unwrap().read_to_end(&mut data).unwrap();

        assert_eq!(data.len(), 32);
        for line in data.chunks_exact(16) {
            assert_eq!(&line[..12], &[30, 20, 10, 255, 30, 20, 10, 255, 30, 20, 10, 255]);
            assert_eq!(&line[12..], &[0, 0, 0, 0]);
        }
    }

    #[test]
    fn short_stride_is_rejected() {
        let tmp = tempfile::NamedTempFile::new().unwrap();
        let geometry = Geometry {
            width: 4,
            height: 1,
            bits_per_pixel: 32,
            stride: 8,
        };
        let res = Framebuffer::with_file(tmp.reopen().unwrap(), geometry, 255);
        assert!(matches!(res, Err(CalError::Geometry(_))));
    }
}
