//! Terminal rendering for the portal screens. Presentation only; every
//! decision about who may see what happens in the guard before these run.

use crate::calendar::{self, Notes, DAY_HEADERS, MONTH_NAMES};
use crate::directory::UserEntry;
use crate::profile::Profile;
use chrono::{Datelike, NaiveDate};

pub fn login_screen() {
    println!("==========================================");
    println!("  Login ke Toolbox");
    println!("  Silakan masuk untuk melanjutkan");
    println!("==========================================");
    println!("Sign in with: /login <username> <password>");
}

pub fn unauthorized() {
    println!("You do not have access to that page.");
    println!("Use /open to return to your dashboard, or /logout to switch accounts.");
}

/// The admin panel's user-management table.
pub fn admin_dashboard(users: &[UserEntry]) {
    println!("ADMIN - Users Management");
    println!("Daftar Pengguna ({})", users.len());
    println!();

    if users.is_empty() {
        println!("Tidak ada pengguna. Mari buat satu!");
        println!("Add one with: /users add username=... fullName=... ...");
        return;
    }

    println!(
        "  {:<3} {:<22} {:<20} {:<16} {:<6} id",
        "#", "Nama Lengkap", "Jabatan", "Departemen", "Role"
    );
    for (i, user) in users.iter().enumerate() {
        println!(
            "  {:<3} {:<22} {:<20} {:<16} {:<6} {}",
            i, user.full_name, user.position, user.department, user.role, user.id
        );
    }
    println!();
    println!("Edit with /users edit <#|id> key=value..., delete with /users rm <#|id>");
}

/// Fallback shown when the directory has no entry to showcase.
pub fn guest_user() -> UserEntry {
    UserEntry {
        id: "guest".to_string(),
        username: "GuestUser".to_string(),
        full_name: "Pengguna Tamu".to_string(),
        email: "guest@company.com".to_string(),
        role: "user".to_string(),
        position: "Visitor".to_string(),
        department: "External".to_string(),
        phone_number: "N/A".to_string(),
        password: String::new(),
    }
}

/// Time-of-day greeting addressed to the first name.
pub fn greeting(full_name: &str, hour: u32) -> String {
    let base_name = full_name.split_whitespace().next().unwrap_or(full_name);
    let greeting = if hour < 12 {
        "Good Morning"
    } else if hour < 18 {
        "Good Afternoon"
    } else {
        "Good Evening"
    };
    format!("{}, {}!", greeting, base_name)
}

/// The employee dashboard: greeting, stat cards, recent activity.
pub fn user_dashboard(user: &UserEntry, hour: u32) {
    println!("Portal Karyawan - Dashboard");
    println!();
    println!("{}", greeting(&user.full_name, hour));
    println!("Semoga hari Anda produktif dan menyenangkan.");
    println!();
    println!("  Sisa Cuti Tahunan : 12 Hari");
    println!("  Jam Kerja Hari Ini: 8 Jam");
    println!("  Notifikasi Baru   : 3 Item");
    println!();
    println!("Aktivitas Terbaru:");
    println!("  - Mengirim laporan mingguan kepada Manager Proyek. (10 menit lalu)");
    println!("  - Membalas email dari tim Keuangan. (2 jam lalu)");
    println!();
    println!("Signed in as {} ({})", user.username, user.position);
}

/// The session-derived profile card with the job summary.
pub fn profile_card(profile: &Profile) {
    println!("{}", profile.name);
    println!("{}", profile.id);
    println!();
    println!("  Jabatan   : {}", profile.title);
    println!("  Departemen: {}", profile.department);
    println!("  No.Telp   : {}", profile.phone);
    println!("  Email     : {}", profile.email);
    println!("  Role      : {}", profile.role.to_uppercase());
    println!();
    println!("Aktivitas & Ringkasan Pekerjaan:");
    println!("  Open: 5   Progress: 12   Review: 3   Success: 25");
}

pub fn month_title(year: i32, month: u32) -> String {
    let name = MONTH_NAMES
        .get(month.saturating_sub(1) as usize)
        .copied()
        .unwrap_or("?");
    format!("{} {}", name, year)
}

/// Render the month grid. Today is marked with `*`, days carrying a note
/// with `.`.
pub fn calendar(year: i32, month: u32, notes: &Notes, today: NaiveDate) {
    println!("Kalender & Catatan Harian");
    println!("{:^34}", month_title(year, month));

    for day in DAY_HEADERS {
        print!(" {:>3}", day);
    }
    println!();

    let cells = calendar::month_cells(year, month);
    for (i, cell) in cells.iter().enumerate() {
        match cell {
            None => print!("    "),
            Some(day) => {
                let date = NaiveDate::from_ymd_opt(year, month, *day);
                let marker = if date == Some(today) {
                    '*'
                } else if date.is_some_and(|d| calendar::has_note(notes, d)) {
                    '.'
                } else {
                    ' '
                };
                print!(" {:>2}{}", day, marker);
            }
        }
        if (i + 1) % 7 == 0 {
            println!();
        }
    }
    if cells.len() % 7 != 0 {
        println!();
    }
    println!();
    println!("Today is marked with '*', days with a note with '.'");
    println!("Save a note with: /note {}-{}-{} <text>", today.year(), today.month(), today.day());
}
