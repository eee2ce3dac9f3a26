pub mod cli;
pub mod errors;
pub mod frame_loop;
pub mod loader;
pub mod viewer;

#[cfg(feature = "bevy_app")]
pub mod bevy_app;

use std::str::FromStr;

use tracing::info;

use dxfview_config::AppConfig;
use dxfview_core::color::Rgb;
use dxfview_core::geometry::Point3;
use dxfview_core::primitive::MaterialStyle;
use dxfview_engine::navigation::NavigationOptions;
use dxfview_engine::session::ViewportOptions;
use errors::FrontendError;
use loader::SourceReference;

/// 把配置转换为视口选项，颜色非法时报错。
pub fn viewport_options(config: &AppConfig) -> Result<ViewportOptions, FrontendError> {
    let viewport = &config.viewport;
    let navigation = &config.navigation;
    Ok(ViewportOptions {
        background: parse_color("viewport.background", &viewport.background)?,
        material: MaterialStyle {
            line_color: parse_color("viewport.line_color", &viewport.line_color)?,
            face_color: parse_color("viewport.face_color", &viewport.face_color)?,
            dash_size: viewport.dash_size,
            gap_size: viewport.gap_size,
        },
        camera_start: viewport
            .camera_start
            .map(|[x, y, z]| Point3::new(x, y, z)),
        camera_z: viewport.camera_z,
        navigation: NavigationOptions {
            enable_pan: navigation.enable_pan,
            enable_zoom: navigation.enable_zoom,
            enable_rotate: navigation.enable_rotate,
            enable_damping: navigation.enable_damping,
            damping_factor: navigation.damping_factor,
        },
    })
}

fn parse_color(field: &'static str, raw: &str) -> Result<Rgb, FrontendError> {
    Rgb::from_str(raw).map_err(|source| FrontendError::InvalidColor { field, source })
}

/// 在当前线程上运行无头加载并把摘要打印到标准输出。
pub fn run_cli(
    config: &AppConfig,
    source: SourceReference,
    frames: Option<u64>,
) -> Result<(), FrontendError> {
    info!(source = %source, "启动 CLI 前端");
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    let outcome = runtime.block_on(cli::run(config, source, frames))?;
    print!("{}", cli::render_report(&outcome));
    Ok(())
}

/// 启动 Bevy + egui 桌面前端，若未启用 `bevy_app` 特性则返回错误。
pub fn launch_bevy_desktop(
    config: &AppConfig,
    source: Option<SourceReference>,
) -> Result<(), FrontendError> {
    #[cfg(feature = "bevy_app")]
    {
        info!(title = %config.frontend.window_title, "启动 Bevy 桌面前端");
        bevy_app::launch(config, source)
    }
    #[cfg(not(feature = "bevy_app"))]
    {
        let _ = (config, source);
        Err(FrontendError::BevyFeatureDisabled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_converts_to_viewport_options() {
        let options = viewport_options(&AppConfig::default()).expect("convert defaults");
        assert_eq!(options.background, Rgb::BLACK);
        assert_eq!(options.material, MaterialStyle::default());
        assert!(options.camera_start.is_none());
        assert_eq!(options.navigation, NavigationOptions::default());
    }

    #[test]
    fn invalid_color_names_the_field() {
        let mut config = AppConfig::default();
        config.viewport.line_color = "chartreuse".to_string();
        let err = viewport_options(&config).unwrap_err();
        assert!(matches!(
            err,
            FrontendError::InvalidColor {
                field: "viewport.line_color",
                ..
            }
        ));
    }

    #[cfg(not(feature = "bevy_app"))]
    #[test]
    fn bevy_launch_requires_feature() {
        let err = launch_bevy_desktop(&AppConfig::default(), None).unwrap_err();
        assert!(matches!(err, FrontendError::BevyFeatureDisabled));
    }
}
