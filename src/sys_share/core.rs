//! LAN address discovery and QR encoding of the share URL.

use std::io::Cursor;
use std::net::{IpAddr, Ipv4Addr};

use image::imageops::{self, FilterType};
use image::{DynamicImage, ImageFormat, Luma};
use qrcode::{EcLevel, QrCode};
use thiserror::Error;
use tracing::warn;

/// Edge length of the rendered QR image, in pixels.
pub const QR_SIZE: u32 = 256;

const LAN_PREFIXES: [&str; 3] = ["192.168.", "10.", "172."];

#[derive(Debug, Error)]
pub enum ShareError {
    #[error("qr encoding failed: {0}")]
    Qr(#[from] qrcode::types::QrError),
    #[error("png encoding failed: {0}")]
    Png(#[from] image::ImageError),
}

/// Pick the first non-loopback IPv4 address in a private-looking range.
///
/// Each item is an address and whether its interface is a loopback one.
pub fn pick_lan_address<I>(addrs: I) -> Ipv4Addr
where
    I: IntoIterator<Item = (IpAddr, bool)>,
{
    addrs
        .into_iter()
        .filter(|(ip, loopback)| !loopback && !ip.is_loopback())
        .filter_map(|(ip, _)| match ip {
            IpAddr::V4(v4) => Some(v4),
            IpAddr::V6(_) => None,
        })
        .find(|v4| {
            let dotted = v4.to_string();
            LAN_PREFIXES.iter().any(|prefix| dotted.starts_with(prefix))
        })
        .unwrap_or(Ipv4Addr::LOCALHOST)
}

/// Best guess at the address a phone on the same network can reach.
pub fn resolve_lan_address() -> Ipv4Addr {
    match if_addrs::get_if_addrs() {
        Ok(ifaces) => pick_lan_address(ifaces.iter().map(|i| (i.ip(), i.is_loopback()))),
        Err(e) => {
            warn!("cannot enumerate interfaces: {e}");
            Ipv4Addr::LOCALHOST
        }
    }
}

pub fn share_url(addr: Ipv4Addr, port: u16) -> String {
    format!("http://{addr}:{port}")
}

/// Render `url` as a `QR_SIZE`x`QR_SIZE` PNG QR code with medium error correction.
pub fn encode_qr_png(url: &str) -> Result<Vec<u8>, ShareError> {
    let code = QrCode::with_error_correction_level(url.as_bytes(), EcLevel::M)?;
    let rendered = code
        .render::<Luma<u8>>()
        .min_dimensions(QR_SIZE, QR_SIZE)
        .build();
    // module size is an integer, so the render overshoots; scale back down
    let img = imageops::resize(&rendered, QR_SIZE, QR_SIZE, FilterType::Nearest);

    let mut png = Vec::new();
    DynamicImage::ImageLuma8(img).write_to(&mut Cursor::new(&mut png), ImageFormat::Png)?;
    Ok(png)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v4(a: u8, b: u8, c: u8, d: u8) -> IpAddr {
        IpAddr::V4(Ipv4Addr::new(a, b, c, d))
    }

    #[test]
    fn prefers_private_address_over_public_and_loopback() {
        let picked = pick_lan_address([
            (v4(127, 0, 0, 1), true),
            (v4(203, 0, 113, 5), false),
            (v4(192, 168, 1, 42), false),
        ]);
        assert_eq!(picked, Ipv4Addr::new(192, 168, 1, 42));
    }

    #[test]
    fn falls_back_to_loopback() {
        assert_eq!(pick_lan_address([(v4(127, 0, 0, 1), true)]), Ipv4Addr::LOCALHOST);
        assert_eq!(pick_lan_address(Vec::new()), Ipv4Addr::LOCALHOST);
        assert_eq!(
            pick_lan_address([(v4(203, 0, 113, 5), false)]),
            Ipv4Addr::LOCALHOST
        );
    }

    #[test]
    fn skips_ipv6_and_takes_first_match() {
        let picked = pick_lan_address([
            ("fe80::1".parse().unwrap(), false),
            (v4(10, 0, 0, 7), false),
            (v4(172, 16, 0, 2), false),
        ]);
        assert_eq!(picked, Ipv4Addr::new(10, 0, 0, 7));
    }

    #[test]
    fn share_url_includes_port() {
        assert_eq!(
            share_url(Ipv4Addr::new(192, 168, 1, 42), 8080),
            "http://192.168.1.42:8080"
        );
    }

    #[test]
    fn qr_is_a_256_square_png() {
        for url in ["http://192.168.1.42:8080", "http://10.0.0.7:65535"] {
            let png = encode_qr_png(url).unwrap();
            assert!(png.starts_with(&[0x89, b'P', b'N', b'G', b'\r', b'\n', 0x1a, b'\n']));

            let decoded = image::load_from_memory_with_format(&png, ImageFormat::Png).unwrap();
            assert_eq!((decoded.width(), decoded.height()), (256, 256));
        }
    }
}
