use crate::config::GameConfig;
use crate::engine::hud::{self, Hud, Meter};
use crate::engine::input::KeyState;
use crate::engine::motion::World;
use crate::engine::signals::{Counter, EventRecord, Signals, Telemetry};
use crate::engine::texture::{TextureCache, TextureSpec};
use crate::engine::timer::Clock;
use crate::engine::tween::{Easing, Tween, TweenId, Tweens};
use crate::engine::{Color, Rect, Renderer, Vec2};
use crate::scenes::{keys, status_hud, Scene, SceneKind};

const MAX_HEALTH: f64 = 100.0;
const DAMAGE: f64 = 10.0;
const HEAL: f64 = 15.0;
const BAR_TWEEN_MS: f64 = 300.0;
const FLASH_MS: f64 = 80.0;
const FLASH_ALPHA: f64 = 0.3;

const BAR_WIDTH: f64 = 300.0;
const BAR_HEIGHT: f64 = 24.0;

/// Health bar that eases toward its value, with a hit flash
pub struct Health {
    world: World,
    clock: Clock,
    telemetry: Telemetry,
    hud: Hud,
    health: Meter,
    tweens: Tweens,
    bar: Option<TweenId>,
    flash: Option<TweenId>,
    hits: Counter,
    heals: Counter,
    defeated: bool,
}

impl Health {
    pub fn new(config: &GameConfig) -> Self {
        let mut scene = Health {
            world: config.world(),
            clock: Clock::new(),
            telemetry: Telemetry::new(),
            hud: status_hud(),
            health: Meter::new(MAX_HEALTH),
            tweens: Tweens::new(),
            bar: None,
            flash: None,
            hits: Counter::new(),
            heals: Counter::new(),
            defeated: false,
        };
        scene.publish();
        scene
    }

    /// Bar fill as drawn, trails the meter while its tween runs
    fn bar_fraction(&self) -> f64 {
        self.bar
            .and_then(|id| self.tweens.value(id))
            .unwrap_or_else(|| self.health.fraction())
    }

    fn flash_alpha(&self) -> f64 {
        self.flash
            .and_then(|id| self.tweens.value(id))
            .unwrap_or(1.0)
    }

    /// Restart the bar tween from `from`, the fill drawn before the meter changed
    fn retarget_bar(&mut self, from: f64) {
        if let Some(id) = self.bar.take() {
            self.tweens.kill(id);
        }
        let tween = Tween::new(from, self.health.fraction(), BAR_TWEEN_MS)
            .with_easing(Easing::QuadOut);
        self.bar = Some(self.tweens.add(tween));
    }

    fn start_flash(&mut self) {
        if let Some(id) = self.flash.take() {
            self.tweens.kill(id);
        }
        self.flash = Some(self.tweens.add(Tween::new(1.0, FLASH_ALPHA, FLASH_MS).yoyo()));
    }

    fn damage(&mut self) {
        if self.defeated {
            return;
        }
        let before = self.health.value();
        let shown = self.bar_fraction();
        if !self.health.apply(-DAMAGE) {
            return;
        }
        let hits = self.hits.increment();
        self.telemetry.emit(
            EventRecord::new("damaged", self.clock.now())
                .with("amount", before - self.health.value())
                .with("health", self.health.value())
                .with("hits", hits),
        );
        self.start_flash();
        self.retarget_bar(shown);

        if self.health.is_empty() {
            self.defeated = true;
            self.telemetry
                .emit(EventRecord::new("defeated", self.clock.now()).with("hits", hits));
        }
    }

    fn heal(&mut self) {
        if self.defeated {
            return;
        }
        let before = self.health.value();
        let shown = self.bar_fraction();
        if !self.health.apply(HEAL) {
            return;
        }
        let heals = self.heals.increment();
        self.telemetry.emit(
            EventRecord::new("healed", self.clock.now())
                .with("amount", self.health.value() - before)
                .with("health", self.health.value())
                .with("heals", heals),
        );
        self.retarget_bar(shown);
    }

    fn revive(&mut self) {
        if !self.defeated {
            return;
        }
        self.defeated = false;
        let shown = self.bar_fraction();
        self.health.set(self.health.max());
        self.telemetry.emit(
            EventRecord::new("revived", self.clock.now()).with("health", self.health.value()),
        );
        self.retarget_bar(shown);
    }

    fn publish(&mut self) {
        let signals = &mut self.telemetry.signals;
        signals.set("health", self.health.value());
        signals.set("hits", self.hits);
        signals.set("heals", self.heals);
        signals.set("defeated", self.defeated);
        self.hud.sync(signals, hud_lines);
    }
}

fn hud_lines(signals: &Signals) -> Vec<String> {
    let number = |name| signals.number(name).unwrap_or(0.0);
    let prompt = if signals.flag("defeated") == Some(true) {
        "DEFEATED - Space to revive"
    } else {
        "H or left click to take damage, R or right click to heal"
    };
    vec![
        format!("Health: {}/{}", number("health"), MAX_HEALTH),
        format!("Hits: {}", number("hits")),
        format!("Heals: {}", number("heals")),
        prompt.to_string(),
    ]
}

fn bar_color(fraction: f64) -> Color {
    if fraction > 0.5 {
        Color(0x00ff00)
    } else if fraction > 0.25 {
        Color(0xffff00)
    } else {
        Color(0xff0000)
    }
}

impl Scene for Health {
    fn kind(&self) -> SceneKind {
        SceneKind::Health
    }

    fn textures(&self) -> Vec<TextureSpec> {
        vec![TextureSpec::new("hero", 48, 48)
            .fill_circle(Vec2::new(24.0, 24.0), 22.0, Color(0x4a90d9))
            .stroke_rect(Rect::from_xywh(1.0, 1.0, 46.0, 46.0), Color::WHITE, 2.0)]
    }

    fn update(&mut self, keystate: &KeyState, delta_ms: f64) {
        self.clock.advance(delta_ms);

        if keystate.just_pressed(keys::KEY_H) || keystate.pointer().just_pressed {
            self.damage();
        }
        if keystate.just_pressed(keys::KEY_R) || keystate.pointer().right_just_pressed {
            self.heal();
        }
        if keystate.just_pressed(keys::SPACE) {
            self.revive();
        }

        for id in self.tweens.update(delta_ms) {
            if self.bar == Some(id) {
                self.bar = None;
            }
            if self.flash == Some(id) {
                self.flash = None;
            }
        }

        self.publish();
    }

    fn draw(&self, renderer: &Renderer, textures: &TextureCache) {
        let center = self.world.center();
        textures.draw_with_alpha(renderer, "hero", center, self.flash_alpha());

        let fraction = self.bar_fraction();
        let track = Rect::from_xywh(
            center.x - BAR_WIDTH * 0.5,
            center.y - 80.0,
            BAR_WIDTH,
            BAR_HEIGHT,
        );
        hud::draw_bar(renderer, &track, fraction, bar_color(fraction), Color(0x333333));
        renderer.stroke_rect(&track, Color::WHITE, 2.0);
        self.hud.draw(renderer);
    }

    fn telemetry(&self) -> &Telemetry {
        &self.telemetry
    }

    fn telemetry_mut(&mut self) -> &mut Telemetry {
        &mut self.telemetry
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::input::{InputEvent, LEFT_BUTTON, RIGHT_BUTTON};
    use crate::scenes::testing::{run, tap, STEP_MS};
    use approx::assert_relative_eq;

    fn scene() -> Health {
        Health::new(&GameConfig::default())
    }

    #[test]
    fn ten_hits_defeat_and_further_damage_is_ignored() {
        let mut scene = scene();
        let mut keys = KeyState::new();

        for _ in 0..12 {
            tap(&mut scene, &mut keys, keys::KEY_H);
        }

        assert_eq!(scene.health.value(), 0.0);
        assert!(scene.defeated);
        assert_eq!(scene.hits.get(), 10);
        assert_eq!(scene.telemetry.events.count("damaged"), 10);
        assert_eq!(scene.telemetry.events.count("defeated"), 1);
        assert_eq!(scene.telemetry.signals.flag("defeated"), Some(true));
    }

    #[test]
    fn heals_cap_at_max_and_only_count_when_they_apply() {
        let mut scene = scene();
        let mut keys = KeyState::new();

        tap(&mut scene, &mut keys, keys::KEY_H);
        tap(&mut scene, &mut keys, keys::KEY_R);
        assert_eq!(scene.health.value(), MAX_HEALTH);
        let healed = scene.telemetry.events.last("healed").unwrap();
        assert_eq!(*healed.field("amount").unwrap(), 10.0);

        tap(&mut scene, &mut keys, keys::KEY_R);
        assert_eq!(scene.heals.get(), 1);
        assert_eq!(scene.telemetry.signals.number("heals"), Some(1.0));
    }

    #[test]
    fn revive_is_the_only_way_back() {
        let mut scene = scene();
        let mut keys = KeyState::new();
        tap(&mut scene, &mut keys, keys::SPACE);
        assert_eq!(scene.telemetry.events.count("revived"), 0);

        for _ in 0..10 {
            tap(&mut scene, &mut keys, keys::KEY_H);
        }
        tap(&mut scene, &mut keys, keys::KEY_R);
        assert_eq!(scene.health.value(), 0.0);
        assert_eq!(scene.heals.get(), 0);

        tap(&mut scene, &mut keys, keys::SPACE);
        assert!(!scene.defeated);
        assert_eq!(scene.health.value(), MAX_HEALTH);
        assert_eq!(scene.telemetry.events.count("revived"), 1);

        tap(&mut scene, &mut keys, keys::KEY_H);
        assert_eq!(scene.hits.get(), 11);
    }

    #[test]
    fn bar_eases_to_the_new_value() {
        let mut scene = scene();
        let mut keys = KeyState::new();

        tap(&mut scene, &mut keys, keys::KEY_H);
        let shown = scene.bar_fraction();
        assert!(shown < 1.0 && shown > 0.9);

        run(&mut scene, &mut keys, 15, STEP_MS);
        assert!(scene.bar.is_none());
        assert_relative_eq!(scene.bar_fraction(), 0.9);
    }

    #[test]
    fn second_hit_retargets_from_the_drawn_value() {
        let mut scene = scene();
        let mut keys = KeyState::new();

        tap(&mut scene, &mut keys, keys::KEY_H);
        run(&mut scene, &mut keys, 2, STEP_MS);
        let before = scene.bar_fraction();
        tap(&mut scene, &mut keys, keys::KEY_H);

        // no jump back to 1.0, heading for 0.8 now
        assert!(scene.bar_fraction() <= before);
        assert_eq!(scene.tweens.len(), 2);
        run(&mut scene, &mut keys, 20, STEP_MS);
        assert_relative_eq!(scene.bar_fraction(), 0.8);
        assert!(scene.tweens.is_empty());
    }

    #[test]
    fn hit_flash_dips_then_returns() {
        let mut scene = scene();
        let mut keys = KeyState::new();

        tap(&mut scene, &mut keys, keys::KEY_H);
        assert!(scene.flash_alpha() < 1.0);
        assert!(scene.flash_alpha() >= FLASH_ALPHA);

        // 80 ms down, 80 ms back
        run(&mut scene, &mut keys, 8, STEP_MS);
        assert!(scene.flash.is_none());
        assert_eq!(scene.flash_alpha(), 1.0);
    }

    #[test]
    fn left_click_damages() {
        let mut scene = scene();
        let mut keys = KeyState::new();
        keys.apply(InputEvent::PointerDown {
            button: LEFT_BUTTON,
            position: Vec2::new(400.0, 300.0),
        });

        scene.update(&keys, STEP_MS);
        keys.end_frame();
        scene.update(&keys, STEP_MS);

        assert_eq!(scene.hits.get(), 1);
        assert_eq!(scene.health.value(), 90.0);
    }

    #[test]
    fn heal_after_the_bar_settles_animates() {
        let mut scene = scene();
        let mut keys = KeyState::new();
        tap(&mut scene, &mut keys, keys::KEY_H);
        tap(&mut scene, &mut keys, keys::KEY_H);
        run(&mut scene, &mut keys, 20, STEP_MS);
        assert!(scene.bar.is_none());
        assert_relative_eq!(scene.bar_fraction(), 0.8);

        tap(&mut scene, &mut keys, keys::KEY_R);
        let shown = scene.bar_fraction();
        assert!(shown > 0.8 && shown < 0.95);

        run(&mut scene, &mut keys, 15, STEP_MS);
        assert_relative_eq!(scene.bar_fraction(), 0.95);
    }

    #[test]
    fn revive_fills_the_bar_gradually() {
        let mut scene = scene();
        let mut keys = KeyState::new();
        for _ in 0..10 {
            tap(&mut scene, &mut keys, keys::KEY_H);
        }
        run(&mut scene, &mut keys, 20, STEP_MS);
        assert_eq!(scene.bar_fraction(), 0.0);

        tap(&mut scene, &mut keys, keys::SPACE);
        let shown = scene.bar_fraction();
        assert!(shown > 0.0 && shown < 1.0);

        run(&mut scene, &mut keys, 15, STEP_MS);
        assert_relative_eq!(scene.bar_fraction(), 1.0);
    }

    #[test]
    fn right_click_heals() {
        let mut scene = scene();
        let mut keys = KeyState::new();
        tap(&mut scene, &mut keys, keys::KEY_H);

        keys.apply(InputEvent::PointerDown {
            button: RIGHT_BUTTON,
            position: Vec2::new(400.0, 300.0),
        });
        scene.update(&keys, STEP_MS);
        keys.end_frame();
        scene.update(&keys, STEP_MS);

        assert_eq!(scene.heals.get(), 1);
        assert_eq!(scene.hits.get(), 1);
        assert_eq!(scene.health.value(), MAX_HEALTH);
    }
}
