use irq_shooter::error::{ArcadeError, DeviceError};
use irq_shooter::framebuffer::*;
use irq_shooter::sprite::{draw_sprite, Pixmap, SPRITE_BACKGROUND};
use irq_shooter::video::{HeadlessDevice, ModeId, VideoMode};

fn framebuffer(id: ModeId) -> FrameBuffer {
    let mut device = HeadlessDevice::new();
    FrameBuffer::initialize(&mut device, id, ColorKey::default()).unwrap()
}

fn bytes_at(fb: &FrameBuffer, x: i32, y: i32) -> Vec<u8> {
    let bpp = fb.mode().bytes_per_pixel();
    let at = (fb.mode().x_resolution as usize * y as usize + x as usize) * bpp;
    fb.back_buffer()[at..at + bpp].to_vec()
}

// ── Initialisation ────────────────────────────────────────────────────────────

#[test]
fn initialize_sizes_both_buffers_to_the_mode() {
    let mut device = HeadlessDevice::new();
    let fb = FrameBuffer::initialize(&mut device, ModeId::M800X600, ColorKey::default()).unwrap();
    let expected = 800 * 600 * 3;
    assert_eq!(fb.back_buffer().len(), expected);
    assert_eq!(fb.video_memory().map(<[u8]>::len), Some(expected));
    assert!(fb.back_buffer().iter().all(|&b| b == 0));
    assert_eq!(device.current, Some(ModeId::M800X600));
    assert_eq!(device.mappings, 1);
}

#[test]
fn refused_grant_is_a_device_error() {
    let mut device = HeadlessDevice {
        refuse_grants: true,
        ..HeadlessDevice::default()
    };
    let result = FrameBuffer::initialize(&mut device, ModeId::M640X480, ColorKey::default());
    assert!(matches!(
        result,
        Err(ArcadeError::Device(DeviceError::GrantRefused { .. }))
    ));
    // Never switched into the mode.
    assert_eq!(device.current, None);
}

// ── Encodings ─────────────────────────────────────────────────────────────────

#[test]
fn red_encodes_per_depth() {
    assert_eq!(encode(15, 0xFF0000), 0x7C00);
    assert_eq!(encode(16, 0xFF0000), 0xF800);
    assert_eq!(encode(24, 0xFF0000), 0xFF0000);
    assert_eq!(encode(32, 0xFF0000), 0xFF0000);
}

#[test]
fn green_and_blue_truncate_per_depth() {
    assert_eq!(encode(15, 0x00FF00), 0x03E0);
    assert_eq!(encode(16, 0x00FF00), 0x07E0);
    assert_eq!(encode(15, 0x0000FF), 0x001F);
    assert_eq!(encode(16, 0x0000FF), 0x001F);
}

#[test]
fn mixed_channels_drop_low_bits() {
    // r=0x12 g=0x34 b=0x56
    assert_eq!(encode(16, 0x123456), (0x02 << 11) | (0x0D << 5) | 0x0A);
    assert_eq!(encode(15, 0x123456), (0x02 << 10) | (0x06 << 5) | 0x0A);
    assert_eq!(encode(24, 0x123456), 0x123456);
}

#[test]
fn unknown_depth_encodes_as_zero() {
    assert_eq!(encode(8, 0xFFFFFF), 0);
}

#[test]
fn write_pixel_stores_little_endian_native_bytes() {
    let mut fb = framebuffer(ModeId::M1280X1024);
    fb.write_pixel(3, 2, 0xFF0000);
    assert_eq!(bytes_at(&fb, 3, 2), vec![0x00, 0xF8]);
    assert_eq!(fb.pixel_at(3, 2), Some(0xF800));

    let mut fb = framebuffer(ModeId::M800X600);
    fb.write_pixel(0, 0, 0x123456);
    assert_eq!(bytes_at(&fb, 0, 0), vec![0x56, 0x34, 0x12]);

    let mut fb = framebuffer(ModeId::M1152X864);
    fb.write_pixel(1151, 863, 0x123456);
    assert_eq!(bytes_at(&fb, 1151, 863), vec![0x56, 0x34, 0x12, 0x00]);
}

#[test]
fn every_mode_round_trips_primary_colours() {
    for id in ModeId::SUPPORTED {
        let mut fb = framebuffer(id);
        let bpp = fb.mode().bits_per_pixel;
        for rgb in [0xFF0000, 0x00FF00, 0x0000FF, 0xFFFFFF] {
            fb.write_pixel(10, 10, rgb);
            assert_eq!(fb.pixel_at(10, 10).map(|n| decode(bpp, n)), Some(rgb), "{id}");
        }
    }
}

// ── Skipped writes ────────────────────────────────────────────────────────────

#[test]
fn out_of_range_writes_change_nothing() {
    let mut fb = framebuffer(ModeId::M640X480);
    let before = fb.back_buffer().to_vec();
    for (x, y) in [(-1, 0), (0, -1), (640, 0), (0, 480), (640, 480), (i32::MIN, i32::MAX)] {
        fb.write_pixel(x, y, 0xFFFFFF);
    }
    assert_eq!(fb.back_buffer(), &before[..]);
    assert_eq!(fb.pixel_at(640, 0), None);
}

#[test]
fn color_key_writes_change_nothing() {
    let mut fb = framebuffer(ModeId::M1152X864);
    fb.fill(0x123456);
    let before = fb.back_buffer().to_vec();
    for rgb in DEFAULT_COLOR_KEY {
        fb.write_pixel(5, 5, rgb);
        fb.fill_rect(0, 0, 20, 20, rgb);
    }
    assert_eq!(fb.back_buffer(), &before[..]);
}

#[test]
fn custom_color_key_replaces_the_default() {
    let mut device = HeadlessDevice::new();
    let key = ColorKey::new([0x00FF00]);
    let mut fb = FrameBuffer::initialize(&mut device, ModeId::M1152X864, key).unwrap();
    fb.write_pixel(0, 0, 0x00FF00);
    fb.write_pixel(1, 0, 0xAFFFFF);
    assert_eq!(fb.pixel_at(0, 0), Some(0));
    assert_eq!(fb.pixel_at(1, 0), Some(0xAFFFFF));
}

#[test]
fn fill_rect_is_clipped_to_screen() {
    let mut fb = framebuffer(ModeId::M640X480);
    fb.fill_rect(-5, -5, 10, 10, 0xFFFFFF);
    assert_eq!(fb.pixel_at(4, 4), Some(encode(15, 0xFFFFFF)));
    assert_eq!(fb.pixel_at(5, 5), Some(0));
}

// ── Commit & teardown ─────────────────────────────────────────────────────────

#[test]
fn commit_copies_the_whole_frame() {
    let mut fb = framebuffer(ModeId::M640X480);
    fb.write_pixel(1, 1, 0xFFFFFF);
    assert_ne!(fb.video_memory().unwrap(), fb.back_buffer());
    fb.commit_frame().unwrap();
    assert_eq!(fb.video_memory().unwrap(), fb.back_buffer());
}

#[test]
fn commit_is_idempotent() {
    let mut fb = framebuffer(ModeId::M800X600);
    fb.fill_rect(10, 10, 50, 50, 0x336699);
    fb.commit_frame().unwrap();
    let first = fb.video_memory().unwrap().to_vec();
    fb.commit_frame().unwrap();
    assert_eq!(fb.video_memory().unwrap(), &first[..]);
}

#[test]
fn teardown_is_idempotent_and_silences_the_buffer() {
    let mut fb = framebuffer(ModeId::M640X480);
    fb.teardown();
    fb.teardown();
    assert!(!fb.is_live());
    fb.write_pixel(0, 0, 0xFFFFFF);
    fb.fill(0xFFFFFF);
    assert!(fb.commit_frame().is_ok());
    assert_eq!(fb.video_memory(), None);
    assert_eq!(fb.pixel_at(0, 0), None);
}

// ── Sprite compositor ─────────────────────────────────────────────────────────

#[test]
fn sprite_background_is_transparent() {
    let mut fb = framebuffer(ModeId::M1152X864);
    let pixmap = Pixmap::new(
        "test",
        2,
        2,
        vec![0xFF_FF0000, 0xFF00_0000 | SPRITE_BACKGROUND, 0xFF_00FF00, 0xFF_0000FF],
    )
    .unwrap();
    draw_sprite(&mut fb, &pixmap, 10, 20);
    assert_eq!(fb.pixel_at(10, 20), Some(0xFF0000));
    assert_eq!(fb.pixel_at(11, 20), Some(0));
    assert_eq!(fb.pixel_at(10, 21), Some(0x00FF00));
    assert_eq!(fb.pixel_at(11, 21), Some(0x0000FF));
}

#[test]
fn sprite_straddling_the_edge_is_clipped() {
    let mut fb = framebuffer(ModeId::M640X480);
    let pixmap = Pixmap::new("test", 4, 4, vec![0xFFFFFF; 16]).unwrap();
    draw_sprite(&mut fb, &pixmap, 638, -2);
    let white = encode(15, 0xFFFFFF);
    assert_eq!(fb.pixel_at(638, 0), Some(white));
    assert_eq!(fb.pixel_at(639, 1), Some(white));
    assert_eq!(fb.pixel_at(637, 0), Some(0));
    assert_eq!(fb.pixel_at(638, 2), Some(0));
}

#[test]
fn mode_description_matches_supported_table() {
    let m = VideoMode::describe(ModeId::M1280X1024);
    assert_eq!((m.x_resolution, m.y_resolution, m.bits_per_pixel), (1280, 1024, 16));
    assert_eq!(m.bytes_per_pixel(), 2);
}
