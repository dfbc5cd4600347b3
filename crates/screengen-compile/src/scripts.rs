//! The `script:` section: the page-change helper and the refresh loop
//! that re-renders e-paper panels on a per-page schedule.

use screengen_core::Project;

use crate::profiles::DeviceProfile;

pub fn script_section(profile: &DeviceProfile, project: &Project) -> Vec<String> {
    let display_id = profile.display_id();
    let num_pages = project.pages.len().max(1);

    let mut lines = vec!["script:".to_string()];

    lines.push("  - id: change_page_to".to_string());
    lines.push("    mode: restart".to_string());
    lines.push("    parameters:".to_string());
    lines.push("      target_page: int".to_string());
    lines.push("    then:".to_string());
    lines.push("      - lambda: |-".to_string());
    lines.push(format!("          int pages = {num_pages};"));
    lines.push("          int target = target_page % pages;".to_string());
    lines.push("          if (target < 0) target += pages;".to_string());
    lines.push("          id(display_page) = target;".to_string());
    lines.push("          id(last_page_switch_time) = millis() / 1000;".to_string());
    lines.push(format!("      - component.update: {display_id}"));

    lines.push("  - id: manage_run_and_sleep".to_string());
    lines.push("    mode: restart".to_string());
    lines.push("    then:".to_string());
    lines.push("      - wait_until:".to_string());
    lines.push("          condition:".to_string());
    lines.push("            lambda: 'return id(ha_time).now().is_valid();'".to_string());
    lines.push("          timeout: 120s".to_string());
    lines.push("      - lambda: |-".to_string());
    lines.push("          int page = id(display_page);".to_string());
    lines.push("          int interval = id(page_refresh_default_s);".to_string());

    let overrides: Vec<(usize, u32)> = project
        .pages
        .iter()
        .enumerate()
        .filter_map(|(i, p)| p.refresh_time.map(|t| (i, t)))
        .collect();
    if !overrides.is_empty() {
        lines.push("          switch (page) {".to_string());
        for (i, t) in overrides {
            lines.push(format!("            case {i}: interval = {t}; break;"));
        }
        lines.push("          }".to_string());
    }

    lines.push("          if (interval < 60) { interval = 60; }".to_string());
    lines.push("          id(page_refresh_current_s) = interval;".to_string());
    lines.push(
        "          ESP_LOGI(\"refresh\", \"Next refresh in %d seconds for page %d\", interval, page);"
            .to_string(),
    );
    lines.push(format!("      - component.update: {display_id}"));
    lines.push("      - delay: !lambda 'return id(page_refresh_current_s) * 1000;'".to_string());
    lines.push("      - script.execute: manage_run_and_sleep".to_string());
    lines.push(String::new());
    lines
}
