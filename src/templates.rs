//! Fixed texts the playground starts from.

use rand::seq::SliceRandom;

/// Code restored by a reset.
pub const EMPTY_CODE: &str = "function setup() {
  // Setup code goes here.
  createCanvas(windowWidth, windowHeight);
}

function draw() {
  // Frame drawing code goes here.
  background(175);
}";

/// Code running when the playground first opens.
pub const STARTUP_CODE: &str = "function setup() {
  createCanvas(windowWidth, windowHeight);
  // Hue 0-360, saturation and brightness 0-100
  colorMode(HSB, 360, 100, 100);
}

function draw() {
  // frameCount grows every frame; scale it down to slow the color change
  let hue = (frameCount * 0.5) % 360;
  background(hue, 90, 90);
}

function windowResized() {
  resizeCanvas(windowWidth, windowHeight);
}";

pub const WELCOME_USER_MESSAGE: &str = "make a simple animation of the background color";
pub const WELCOME_ASSISTANT_MESSAGE: &str = "Here's the code! 🎨";
pub const STARTUP_PROMPT_PREFIX: &str = "Start from scratch and ";
pub const NO_CODE_UPDATE: &str = "No new code update.";

pub const EXAMPLE_PROMPTS: &[&str] = &[
    "draw circles that pop up at random positions on the screen",
    "make a ball that moves toward the mouse",
    "draw stars in different colors wherever the screen is clicked",
    "animate a circle that slowly grows and shrinks",
    "make a simple square that keeps moving to the right",
];

pub fn random_prompt() -> &'static str {
    EXAMPLE_PROMPTS
        .choose(&mut rand::thread_rng())
        .copied()
        .unwrap_or_default()
}

/// Text suggested in the input field at startup.
pub fn startup_suggestion() -> String {
    format!("{STARTUP_PROMPT_PREFIX}{}", random_prompt())
}
