use crate::errors::GeneratorError;
use crate::render::{
    LayoutReply, LoadObserver, PageRange, PrintAdapter, PrintAttributes, RenderEngine, RenderSurface,
    SurfaceSettings, WriteReply,
};
use crate::source::ContentSource;
use crate::task::TaskId;
use std::collections::HashMap;
use std::fs::File;
use tokio_util::sync::CancellationToken;

struct SurfaceSlot {
    surface: Box<dyn RenderSurface>,
    /// Present once the task started producing
    adapter: Option<Box<dyn PrintAdapter>>,
}

/// Owns the render engine, every live surface and their print adapters, keyed by task.
///
/// Lives on the confined thread only. It guarantees at most one surface per task and that each
/// surface is torn down exactly once.
pub struct SurfaceController {
    engine: Box<dyn RenderEngine>,
    settings: SurfaceSettings,
    surfaces: HashMap<TaskId, SurfaceSlot>,
}

impl SurfaceController {
    pub fn new(engine: Box<dyn RenderEngine>, settings: SurfaceSettings) -> Self {
        Self { engine, settings, surfaces: HashMap::new() }
    }

    /// Create the task's surface, attach the observer and start loading the source.
    pub fn open(
        &mut self,
        task_id: TaskId,
        source: &ContentSource,
        observer: LoadObserver,
    ) -> Result<(), GeneratorError> {
        if self.surfaces.contains_key(&task_id) {
            log::error!("Task[{}]: render surface already exists", task_id);
            return Err(GeneratorError::internal());
        }

        let mut surface = self.engine.create_surface(&self.settings).map_err(|e| {
            log::error!("Task[{}]: {} could not create a surface: {}", task_id, self.engine.name(), e);
            GeneratorError::internal()
        })?;

        surface.set_observer(Some(observer));
        source.begin_load(surface.as_mut());
        self.surfaces.insert(task_id, SurfaceSlot { surface, adapter: None });

        log::debug!("Task[{}]: surface created, loading {}", task_id, source.kind());
        Ok(())
    }

    /// Create the print adapter for the content loaded on the task's surface, replacing any
    /// earlier one.
    pub fn prepare_print(&mut self, task_id: TaskId, job_name: &str) -> Result<(), GeneratorError> {
        let slot = self.slot(task_id)?;
        let adapter = slot.surface.create_print_adapter(job_name).map_err(|e| {
            log::error!("Task[{}]: cannot create print adapter: {}", task_id, e);
            GeneratorError::Internal("Failed to create PDF output.".to_string())
        })?;

        slot.adapter = Some(adapter);
        Ok(())
    }

    /// Start the layout phase. The outcome arrives on `reply`.
    pub fn layout(
        &mut self,
        task_id: TaskId,
        attributes: &PrintAttributes,
        cancel: CancellationToken,
        reply: LayoutReply,
    ) -> Result<(), GeneratorError> {
        self.adapter(task_id)?.layout(attributes, cancel, reply);
        Ok(())
    }

    /// Start the write phase. The outcome arrives on `reply`.
    pub fn write(
        &mut self,
        task_id: TaskId,
        pages: PageRange,
        output: File,
        cancel: CancellationToken,
        reply: WriteReply,
    ) -> Result<(), GeneratorError> {
        self.adapter(task_id)?.write(pages, output, cancel, reply);
        Ok(())
    }

    /// Drop the print adapter, stop loading, detach the observer and destroy the task's surface.
    /// Returns false when the task has no surface (never created, or already released).
    pub fn release(&mut self, task_id: TaskId) -> bool {
        let Some(SurfaceSlot { mut surface, adapter }) = self.surfaces.remove(&task_id) else {
            return false;
        };

        drop(adapter);
        surface.stop_loading();
        surface.set_observer(None);
        surface.destroy();

        log::debug!("Task[{}]: surface released", task_id);
        true
    }

    /// Release every surface that is still alive.
    pub fn release_all(&mut self) -> usize {
        let ids: Vec<TaskId> = self.surfaces.keys().copied().collect();
        ids.into_iter().filter(|id| self.release(*id)).count()
    }

    pub fn live_surfaces(&self) -> usize {
        self.surfaces.len()
    }

    fn slot(&mut self, task_id: TaskId) -> Result<&mut SurfaceSlot, GeneratorError> {
        self.surfaces.get_mut(&task_id).ok_or_else(|| {
            log::error!("Task[{}]: no render surface", task_id);
            GeneratorError::internal()
        })
    }

    fn adapter(&mut self, task_id: TaskId) -> Result<&mut (dyn PrintAdapter + 'static), GeneratorError> {
        self.slot(task_id)?.adapter.as_deref_mut().ok_or_else(|| {
            log::error!("Task[{}]: no print adapter", task_id);
            GeneratorError::internal()
        })
    }
}
