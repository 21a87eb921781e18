use questwalk_common::SceneGraph;
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, TryRecvError};

use crate::AssetError;
use crate::avatar::{AnimationClip, AssetId, AvatarAsset};
use crate::placeholder::placeholder_avatar;

/// Output of a model load: scene-graph root plus declared clips.
#[derive(Debug, Clone)]
pub struct LoadedModel {
    pub scene: SceneGraph,
    pub clips: Vec<AnimationClip>,
    pub source: AssetId,
}

/// The "load 3D model by URL" capability.
pub trait ModelLoader: Send + Sync + 'static {
    fn load(&self, url: &str) -> Result<LoadedModel, AssetError>;
}

type LoadResult = Result<LoadedModel, AssetError>;

/// Resolves the avatar exactly once, off the frame loop.
///
/// Loads run on a background thread; the scene polls each frame. Any failure
/// (loader error, thread spawn failure, loader panic) resolves to the
/// placeholder avatar.
#[derive(Debug)]
pub struct AvatarResolver {
    state: ResolverState,
}

#[derive(Debug)]
enum ResolverState {
    Pending(Receiver<LoadResult>),
    Ready(Box<AvatarAsset>),
    Done,
}

impl AvatarResolver {
    /// Begin resolving `url` with `loader`. With no URL the placeholder is
    /// ready immediately.
    pub fn spawn(loader: Arc<dyn ModelLoader>, url: Option<String>) -> Self {
        let Some(url) = url else {
            tracing::info!("no avatar URL configured, using placeholder");
            return Self::ready(placeholder_avatar());
        };

        let (tx, rx) = mpsc::channel();
        let spawned = std::thread::Builder::new()
            .name("avatar-loader".into())
            .spawn(move || {
                let result = loader.load(&url);
                // Receiver gone means the scene was torn down first.
                let _ = tx.send(result);
            });

        match spawned {
            Ok(_) => Self {
                state: ResolverState::Pending(rx),
            },
            Err(e) => {
                tracing::warn!("could not start avatar loader thread: {e}");
                Self::ready(placeholder_avatar())
            }
        }
    }

    /// Resolve from an already-available load result (synchronous hosts, tests).
    pub fn immediate(result: Result<LoadedModel, AssetError>) -> Self {
        Self::ready(classify(result))
    }

    fn ready(asset: AvatarAsset) -> Self {
        Self {
            state: ResolverState::Ready(Box::new(asset)),
        }
    }

    /// Check for completion. Yields the asset exactly once.
    pub fn poll(&mut self) -> Option<AvatarAsset> {
        let outcome = match &self.state {
            ResolverState::Done => return None,
            ResolverState::Ready(_) => None,
            ResolverState::Pending(rx) => match rx.try_recv() {
                Ok(result) => Some(classify(result)),
                Err(TryRecvError::Empty) => return None,
                Err(TryRecvError::Disconnected) => {
                    tracing::warn!("avatar loader exited without a result, using placeholder");
                    Some(placeholder_avatar())
                }
            },
        };
        match std::mem::replace(&mut self.state, ResolverState::Done) {
            ResolverState::Ready(asset) => Some(*asset),
            _ => outcome,
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(self.state, ResolverState::Pending(_))
    }

    /// Abandon any in-flight load. A late result is dropped by the loader thread.
    pub fn cancel(&mut self) {
        self.state = ResolverState::Done;
    }
}

fn classify(result: LoadResult) -> AvatarAsset {
    match result {
        Ok(model) => {
            let asset = AvatarAsset::from_model(model);
            tracing::info!(
                kind = asset.kind_name(),
                clips = asset.clips().len(),
                "avatar resolved"
            );
            asset
        }
        Err(e) => {
            tracing::warn!("avatar load failed, using placeholder: {e}");
            placeholder_avatar()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, Instant};

    struct StaticLoader(Vec<AnimationClip>);

    impl ModelLoader for StaticLoader {
        fn load(&self, _url: &str) -> Result<LoadedModel, AssetError> {
            Ok(LoadedModel {
                scene: SceneGraph::new("root"),
                clips: self.0.clone(),
                source: AssetId(9),
            })
        }
    }

    struct FailingLoader;

    impl ModelLoader for FailingLoader {
        fn load(&self, url: &str) -> Result<LoadedModel, AssetError> {
            Err(AssetError::UnsupportedUrl(url.to_string()))
        }
    }

    struct PanickingLoader;

    impl ModelLoader for PanickingLoader {
        fn load(&self, _url: &str) -> Result<LoadedModel, AssetError> {
            panic!("loader blew up");
        }
    }

    fn wait(resolver: &mut AvatarResolver) -> AvatarAsset {
        let deadline = Instant::now() + Duration::from_secs(5);
        loop {
            if let Some(asset) = resolver.poll() {
                return asset;
            }
            assert!(Instant::now() < deadline, "resolver never completed");
            std::thread::sleep(Duration::from_millis(1));
        }
    }

    #[test]
    fn no_url_is_ready_placeholder() {
        let mut r = AvatarResolver::spawn(Arc::new(FailingLoader), None);
        assert!(!r.is_pending());
        let asset = r.poll().unwrap();
        assert!(!asset.is_rigged());
        assert!(r.poll().is_none());
    }

    #[test]
    fn background_load_resolves_rigged() {
        let clips = vec![AnimationClip {
            name: "Idle".into(),
            duration: 1.0,
        }];
        let mut r = AvatarResolver::spawn(Arc::new(StaticLoader(clips)), Some("a.gltf".into()));
        let asset = wait(&mut r);
        assert!(asset.is_rigged());
        assert!(r.poll().is_none());
    }

    #[test]
    fn background_load_without_clips_is_procedural() {
        let mut r = AvatarResolver::spawn(Arc::new(StaticLoader(Vec::new())), Some("a.gltf".into()));
        let asset = wait(&mut r);
        assert!(!asset.is_rigged());
        assert_eq!(asset.source(), Some(AssetId(9)));
    }

    #[test]
    fn failure_resolves_to_placeholder() {
        let mut r = AvatarResolver::spawn(Arc::new(FailingLoader), Some("x".into()));
        let asset = wait(&mut r);
        assert!(!asset.is_rigged());
        assert!(asset.source().is_none());
    }

    #[test]
    fn panicking_loader_resolves_to_placeholder() {
        let mut r = AvatarResolver::spawn(Arc::new(PanickingLoader), Some("x".into()));
        let asset = wait(&mut r);
        assert_eq!(asset.node_roles().arms.len(), 2);
    }

    #[test]
    fn immediate_error_is_placeholder() {
        let mut r = AvatarResolver::immediate(Err(AssetError::GltfParse("bad".into())));
        assert!(!r.poll().unwrap().is_rigged());
    }

    #[test]
    fn cancel_drops_pending_load() {
        let mut r = AvatarResolver::spawn(Arc::new(FailingLoader), Some("x".into()));
        r.cancel();
        assert!(!r.is_pending());
        assert!(r.poll().is_none());
    }
}
