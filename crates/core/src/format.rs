use crate::{pipeline::PipelineOutput, types::Timeline};

/// Format seconds as MM:SS timestamp
pub fn format_timestamp(seconds: f64) -> String {
    let mins = (seconds / 60.0) as u32;
    let secs = (seconds % 60.0) as u32;
    format!("{:02}:{:02}", mins, secs)
}

/// One line per segment: `[start–end] sentence`.
pub fn format_timeline(timeline: &Timeline) -> String {
    timeline
        .segments
        .iter()
        .map(|seg| {
            format!(
                "[{}–{}] {}",
                format_timestamp(seg.start()),
                format_timestamp(seg.end()),
                seg.sentence().trim()
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn format_output_readable(output: &PipelineOutput) -> String {
    let timeline = &output.timeline;
    let mut text = String::new();
    text.push_str(&format!("# Spoiler for {}\n\n", output.video.source_url));
    text.push_str(&format!(
        "**Length:** {:.1}s of {:.1}s target | **Segments:** {}\n\n",
        timeline.total_duration,
        timeline.target_duration,
        timeline.len()
    ));

    text.push_str("## Timeline\n\n");
    text.push_str(&format_timeline(timeline));
    text.push_str("\n\n");

    text.push_str("## Stream\n\n");
    text.push_str(&output.stream_url);
    text.push('\n');

    text
}
