use console::Style;
use pixkit_core::gateway::ImageMeta;
use pixkit_core::jobs::{OffsetsOutcome, RoisOutcome};

struct Styles {
    title: Style,
    label: Style,
    value: Style,
    message: Style,
    disabled: Style,
}

impl Styles {
    fn new() -> Self {
        Self {
            title: Style::new().cyan().bold(),
            label: Style::new().dim(),
            value: Style::new().bold().white(),
            message: Style::new().green(),
            disabled: Style::new().dim().yellow(),
        }
    }
}

pub fn print_offsets_outcome(outcome: &OffsetsOutcome) {
    let s = Styles::new();

    println!();
    println!("  {}", s.title.apply_to("Channel Offsets"));
    println!();
    println!("  {:<14}{}", s.label.apply_to("Message"), s.message.apply_to(&outcome.message));

    match outcome.image() {
        Some(image) => print_image(&s, "Image", image),
        None => print_images(&s, &outcome.images),
    }
    if let Some(ref dataset) = outcome.new_dataset {
        println!(
            "  {:<14}{}",
            s.label.apply_to("New Dataset"),
            s.value.apply_to(format!("{} ({})", dataset.name, dataset.id))
        );
    }
    println!();
}

pub fn print_rois_outcome(outcome: &RoisOutcome) {
    let s = Styles::new();

    println!();
    println!("  {}", s.title.apply_to("Images From ROIs"));
    println!();
    println!("  {:<14}{}", s.label.apply_to("Message"), s.message.apply_to(&outcome.message));

    match outcome.result() {
        Some(image) => print_image(&s, "Result", image),
        None => println!(
            "  {:<14}{}",
            s.label.apply_to("Result"),
            s.disabled.apply_to("none")
        ),
    }
    if outcome.images.len() > 1 {
        print_images(&s, &outcome.images);
    }
    for dataset in &outcome.datasets {
        println!(
            "  {:<14}{}",
            s.label.apply_to("New Dataset"),
            s.value.apply_to(format!("{} ({})", dataset.name, dataset.id))
        );
    }
    println!(
        "  {:<14}{}",
        s.label.apply_to("Timer"),
        s.value.apply_to(format!("{:.2} s", outcome.elapsed_secs))
    );
    println!();
}

fn print_image(s: &Styles, label: &str, image: &ImageMeta) {
    println!(
        "  {:<14}{}",
        s.label.apply_to(label),
        s.value.apply_to(format!(
            "{} ({}) {}x{} Z={} C={} T={}",
            image.name, image.id, image.size_x, image.size_y, image.size_z, image.size_c, image.size_t
        ))
    );
}

fn print_images(s: &Styles, images: &[ImageMeta]) {
    if images.is_empty() {
        return;
    }
    println!("  {}", s.label.apply_to("Images"));
    for image in images {
        println!(
            "    {:<12}{}",
            s.value.apply_to(image.id),
            s.label.apply_to(&image.name)
        );
    }
}
