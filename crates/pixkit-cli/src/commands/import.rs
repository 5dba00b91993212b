use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, ValueEnum};
use pixkit_core::gateway::{Gateway, NewImage};
use pixkit_core::io::plane_io::load_plane;

use super::StoreArgs;

#[derive(Clone, Copy, ValueEnum)]
pub enum AxisArg {
    Z,
    C,
    T,
}

#[derive(Args)]
pub struct ImportArgs {
    #[command(flatten)]
    pub store: StoreArgs,

    /// Grayscale TIFF files, one plane each
    #[arg(required = true)]
    pub files: Vec<PathBuf>,

    /// Image name (defaults to the first file name)
    #[arg(long)]
    pub name: Option<String>,

    /// Axis the files are stacked along
    #[arg(long, value_enum, default_value = "z")]
    pub axis: AxisArg,

    /// Link the new image into this dataset
    #[arg(long, conflicts_with = "new_dataset")]
    pub dataset: Option<u64>,

    /// Create a dataset with this name and link the new image into it
    #[arg(long)]
    pub new_dataset: Option<String>,

    /// Create a project with this name holding the new dataset
    #[arg(long, requires = "new_dataset")]
    pub project: Option<String>,

    /// Physical pixel size in x and y
    #[arg(long)]
    pub pixel_size: Option<f64>,

    /// Channel names, comma-separated
    #[arg(long, value_delimiter = ',')]
    pub channels: Vec<String>,
}

pub fn run(args: &ImportArgs) -> Result<()> {
    let session = args.store.open()?;

    let n = args.files.len();
    let (size_z, size_c, size_t) = match args.axis {
        AxisArg::Z => (n, 1, 1),
        AxisArg::C => (1, n, 1),
        AxisArg::T => (1, 1, n),
    };
    let name = match &args.name {
        Some(name) => name.clone(),
        None => args.files[0]
            .file_name()
            .map(|f| f.to_string_lossy().into_owned())
            .unwrap_or_else(|| "imported".to_string()),
    };

    let mut request = NewImage::new(name, size_z, size_c, size_t);
    request.description = format!("Imported from {} file(s)", n);
    request.physical_size_x = args.pixel_size;
    request.physical_size_y = args.pixel_size;

    let mut planes = args.files.iter().map(|path| load_plane(path));
    let image = session
        .create_image(&request, &mut planes)
        .context("Failed to import planes")?;
    if !args.channels.is_empty() {
        session.set_channel_names(image.id, args.channels.clone())?;
    }

    let dataset = match (&args.new_dataset, args.dataset) {
        (Some(name), _) => {
            let dataset = session.create_dataset(name, "")?;
            if let Some(project) = &args.project {
                let project = session.create_project(project, "")?;
                session.link_project_dataset(project.id, dataset.id)?;
                println!("Created project {}: {}", project.id, project.name);
            }
            Some(dataset.id)
        }
        (None, id) => id,
    };
    if let Some(dataset) = dataset {
        session
            .link_dataset_image(dataset, image.id)
            .with_context(|| format!("Failed to link image into dataset {dataset}"))?;
    }
    session.close()?;

    println!(
        "Imported image {}: {} ({}x{}, Z={} C={} T={}, {})",
        image.id,
        image.name,
        image.size_x,
        image.size_y,
        image.size_z,
        image.size_c,
        image.size_t,
        image.pixel_type
    );
    if let Some(dataset) = dataset {
        println!("Linked into dataset {dataset}");
    }
    Ok(())
}
