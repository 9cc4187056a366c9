use std::thread;
use std::time::Duration;

use anyhow::Result;
use arena2d::{Sound, Sprite};
use image::{Rgba, RgbaImage};

fn checker(side: u32) -> RgbaImage {
    RgbaImage::from_fn(side, side, |x, y| {
        if (x / 4 + y / 4) % 2 == 0 {
            Rgba([240, 240, 240, 255])
        } else {
            Rgba([40, 40, 40, 255])
        }
    })
}

fn main() -> Result<()> {
    env_logger::init();

    let mut args = std::env::args().skip(1);
    let image_source = args.next();
    let sound_source = args.next();

    let mut player = match image_source {
        Some(source) => Sprite::new(source, 0.0, 0.0, 32.0, 32.0).with_layer(1),
        None => Sprite::from_image(checker(16), 0.0, 0.0, 32.0, 32.0).with_layer(1),
    };
    if let Some(err) = player.load_error() {
        log::warn!("Player image missing, drawing nothing: {}", err);
    }
    let wall = Sprite::from_image(checker(16), 100.0, 0.0, 20.0, 200.0).with_layer(0);

    let mut bump = sound_source.map(|source| Sound::new(source, false, 0.8));

    // Walk right until the player runs into the wall.
    let mut steps = 0;
    while !player.collides(&wall) {
        player.move_by(5.0, 0.0);
        steps += 1;
    }
    println!(
        "player hit the wall after {} steps at x = {}",
        steps,
        player.x()
    );

    if let Some(sound) = bump.as_mut() {
        match sound.play() {
            Ok(()) => {
                while sound.is_playing() {
                    thread::sleep(Duration::from_millis(50));
                }
            }
            Err(err) => log::warn!("Could not play {}: {}", sound.source(), err),
        }
        sound.close()?;
    }

    Ok(())
}
