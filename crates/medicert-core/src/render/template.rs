//! Fixed French certificate template.

/// The certificate page. A4, 20mm margins, one page. Every placeholder is
/// substituted on render; the diagnosis paragraph is the only conditional
/// part of the layout. Date fields are substituted unescaped (tera would
/// escape their slashes); `french_date` guarantees they are markup-safe.
pub const TEMPLATE: &str = r#"<!DOCTYPE html>
<html lang="fr">
<head>
<meta charset="utf-8">
<title>Certificat Médical</title>
<style>
  @page { size: A4; margin: 20mm; }
  body { font-family: "Liberation Sans", Arial, sans-serif; font-size: 12pt; color: #000; }
  .letterhead { font-size: 11pt; }
  h1 { text-align: center; font-size: 16pt; letter-spacing: 3px; margin: 48px 0; text-transform: uppercase; }
  p { line-height: 1.8; text-align: justify; }
  .signature { margin-top: 64px; text-align: right; }
</style>
</head>
<body>
<p class="letterhead">{{ clinic_name }}<br>Dr. {{ doctor_name }}</p>
<h1>Certificat Médical</h1>
<p>
  Je soussigné(e), Docteur {{ doctor_name }}, certifie avoir examiné ce jour
  {{ patient_full_name }}, né(e) le {{ patient_birth_date | safe }}
  à {{ patient_birth_place }}, et atteste que son état de santé nécessite
  un arrêt de travail de {{ leave_duration_days }} jour(s), sauf complications.
</p>
{% if diagnosis %}<p class="diagnosis">Diagnostic : {{ diagnosis }}</p>
{% endif %}<p class="signature">Fait à {{ issue_place }}, le {{ issue_date | safe }}<br><br>Signature et cachet</p>
</body>
</html>
"#;
