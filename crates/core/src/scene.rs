//! Explicit context tying the portrait components together.
//!
//! A [`PortraitScene`] is owned by the host and receives each host event
//! as a method call: the one-shot image completion, scroll, resize, and
//! the per-frame tick. Nothing is global, so several scenes can live side
//! by side and tests can drive one without a rendering surface.

use log::{error, info, warn};

use crate::animator::{Animator, FramePacing};
use crate::camera::{Camera, Viewport};
use crate::config::PortraitConfig;
use crate::error::PortraitError;
use crate::particles::{ParticleField, TargetSource};
use crate::prng::Xorshift64;
use crate::raster::Raster;
use crate::sampler::sample;
use crate::scroll::{ScrollTracker, SectionBounds};

/// Unwraps a looked-up host element, logging and failing when it is absent.
pub fn require_anchor<T>(found: Option<T>, selector: &str) -> Result<T, PortraitError> {
    found.ok_or_else(|| {
        error!("portrait anchor '{selector}' not found, skipping initialization");
        PortraitError::MissingAnchor(selector.to_string())
    })
}

/// The portrait's complete runtime state.
#[derive(Debug, Clone)]
pub struct PortraitScene {
    config: PortraitConfig,
    rng: Xorshift64,
    tracker: ScrollTracker,
    animator: Animator,
    camera: Camera,
    field: Option<ParticleField>,
}

impl PortraitScene {
    /// Validates `config` and sets up an empty scene; particles appear once
    /// [`load_image`](Self::load_image) is called.
    pub fn new(config: PortraitConfig, viewport: Viewport) -> Result<Self, PortraitError> {
        config.validate()?;
        info!(
            "initializing particle portrait: {} particles, {}x{} sampling",
            config.particle_count, config.image_width, config.image_height
        );
        Ok(Self {
            rng: Xorshift64::new(config.seed),
            config,
            tracker: ScrollTracker::new(),
            animator: Animator::default(),
            camera: Camera::new(viewport),
            field: None,
        })
    }

    /// Replaces the frame pacing (uncapped by default).
    pub fn with_pacing(mut self, pacing: FramePacing) -> Self {
        self.animator = Animator::new(pacing);
        self
    }

    /// Builds the particle field from the outcome of the image load.
    ///
    /// A failed load, or an image without visible pixels, is logged and
    /// replaced by the fallback sphere. Only the first call has an effect;
    /// later calls keep the existing field.
    pub fn load_image(
        &mut self,
        image: Result<Raster, PortraitError>,
    ) -> Result<TargetSource, PortraitError> {
        if let Some(field) = &self.field {
            warn!("particle field already initialized, ignoring repeated image load");
            return Ok(field.source());
        }

        let built = match image {
            Ok(raster) => self.field_from_raster(&raster),
            Err(e) => Err(e),
        };
        let field = match built {
            Ok(field) => field,
            Err(PortraitError::NoVisiblePixels) => {
                warn!("portrait image has no visible pixels, using fallback sphere");
                ParticleField::fallback(&self.config, &mut self.rng)?
            }
            Err(e) => {
                error!("failed to load portrait image: {e}");
                ParticleField::fallback(&self.config, &mut self.rng)?
            }
        };
        let source = field.source();
        info!("particle field ready ({} particles, {:?})", field.len(), source);
        self.field = Some(field);
        Ok(source)
    }

    fn field_from_raster(&mut self, raster: &Raster) -> Result<ParticleField, PortraitError> {
        if raster.width() != self.config.image_width || raster.height() != self.config.image_height
        {
            warn!(
                "raster is {}x{}, expected {}x{}; sampling as given",
                raster.width(),
                raster.height(),
                self.config.image_width,
                self.config.image_height
            );
        }
        let samples = sample(
            raster,
            self.config.particle_count,
            self.config.sample_scale,
            &mut self.rng,
        )?;
        ParticleField::from_samples(&samples, &self.config, &mut self.rng)
    }

    /// Scroll handler; see [`ScrollTracker::on_scroll`].
    pub fn on_scroll(&mut self, section: SectionBounds, viewport_height: f32) -> Option<f32> {
        self.tracker.on_scroll(section, viewport_height)
    }

    /// Resize handler: recomputes the projection, leaves particles alone.
    pub fn on_resize(&mut self, viewport: Viewport) {
        self.camera.resize(viewport);
    }

    /// Per-frame tick. Returns `true` when the field was recomputed.
    pub fn frame(&mut self, now_ms: f64) -> bool {
        match self.field.as_mut() {
            Some(field) => self.animator.tick(now_ms, &self.tracker, field),
            None => false,
        }
    }

    pub fn config(&self) -> &PortraitConfig {
        &self.config
    }

    pub fn progress(&self) -> f32 {
        self.tracker.progress()
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn animator(&self) -> &Animator {
        &self.animator
    }

    pub fn field(&self) -> Option<&ParticleField> {
        self.field.as_ref()
    }

    /// Mutable access for renderers that consume the dirty flag.
    pub fn field_mut(&mut self) -> Option<&mut ParticleField> {
        self.field.as_mut()
    }
}
