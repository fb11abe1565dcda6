//! Fixed reply texts.

use crate::llm::LLMError;

pub const SESSION_ENDED: &str =
    "Sesi ini sudah berakhir. Klik 'Mulai Sesi Baru' untuk memulai lagi.";

pub const SMALL_TALK: &str = "Halo! 😊\n\nAku siap bantu seputar **psikologi** (kecemasan, tidur anak, hubungan, burnout) \
atau **FAQ** klinik (jam, lokasi, layanan, tarif, booking). Ceritakan singkat yang ingin kamu bahas, ya.";

pub const OFF_TOPIC: &str = "Maaf, aku fokus pada topik psikologi & FAQ klinik. Kalau ada kebutuhan lain, Admin bisa membantu. \
Boleh ceritakan topik psikologi yang kamu pikirkan?";

pub const NOT_CONFIGURED: &str =
    "⚠️ Server belum dikonfigurasi dengan GEMINI_API_KEY. Hubungi admin.";

pub fn generation_failed(error: &LLMError) -> String {
    format!("⚠️ Terjadi kendala saat memproses jawaban: {error}")
}

pub fn meta_who(clinic: &str) -> String {
    format!(
        "### Aku asisten {clinic} 🤖\nAku membantu topik **psikologi** dan **FAQ** klinik."
    )
}

pub fn meta_can(max_turns: u32) -> String {
    format!(
        "### Yang bisa kulakukan\n\
         1. Menjawab pertanyaan psikologi & langkah awal yang aman.\n\
         2. Menjawab **FAQ** (jam, lokasi, layanan, tarif, booking).\n\
         3. Setelah **{max_turns} pesan**, mengklasifikasikan topik & menyarankan tipe psikolog."
    )
}

pub fn meta_about(clinic: &str) -> String {
    format!(
        "### Tentang {clinic}\nLayanan klinik psikologi. Bot membantu menyaring kebutuhan sebelum buat janji."
    )
}

/// Closing used when `closing.txt` is empty.
pub fn default_closing(max_turns: u32) -> String {
    format!(
        "Sesi chat berakhir (kebijakan {max_turns} pesan). Kamu bisa mulai sesi baru kapan saja."
    )
}

pub fn with_recommendation(reply: &str, label: &str, closing: &str) -> String {
    format!(
        "{reply}\n\nDari obrolan kita, sepertinya kamu cocok berkonsultasi dengan **{label}**. Mau jadwalkan sesi?\n{closing}"
    )
}

pub fn with_closing(reply: &str, closing: &str) -> String {
    format!("{reply}\n\n{closing}")
}
