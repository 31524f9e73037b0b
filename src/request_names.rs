//! Names for core protocol request codes and error codes.
//!
//! Only used to make protocol error log lines readable.

/// Core request names indexed by major opcode
const REQUEST_NAMES: [&str; 128] = [
    "",
    "CreateWindow",
    "ChangeWindowAttributes",
    "GetWindowAttributes",
    "DestroyWindow",
    "DestroySubwindows",
    "ChangeSaveSet",
    "ReparentWindow",
    "MapWindow",
    "MapSubwindows",
    "UnmapWindow",
    "UnmapSubwindows",
    "ConfigureWindow",
    "CirculateWindow",
    "GetGeometry",
    "QueryTree",
    "InternAtom",
    "GetAtomName",
    "ChangeProperty",
    "DeleteProperty",
    "GetProperty",
    "ListProperties",
    "SetSelectionOwner",
    "GetSelectionOwner",
    "ConvertSelection",
    "SendEvent",
    "GrabPointer",
    "UngrabPointer",
    "GrabButton",
    "UngrabButton",
    "ChangeActivePointerGrab",
    "GrabKeyboard",
    "UngrabKeyboard",
    "GrabKey",
    "UngrabKey",
    "AllowEvents",
    "GrabServer",
    "UngrabServer",
    "QueryPointer",
    "GetMotionEvents",
    "TranslateCoords",
    "WarpPointer",
    "SetInputFocus",
    "GetInputFocus",
    "QueryKeymap",
    "OpenFont",
    "CloseFont",
    "QueryFont",
    "QueryTextExtents",
    "ListFonts",
    "ListFontsWithInfo",
    "SetFontPath",
    "GetFontPath",
    "CreatePixmap",
    "FreePixmap",
    "CreateGC",
    "ChangeGC",
    "CopyGC",
    "SetDashes",
    "SetClipRectangles",
    "FreeGC",
    "ClearArea",
    "CopyArea",
    "CopyPlane",
    "PolyPoint",
    "PolyLine",
    "PolySegment",
    "PolyRectangle",
    "PolyArc",
    "FillPoly",
    "PolyFillRectangle",
    "PolyFillArc",
    "PutImage",
    "GetImage",
    "PolyText8",
    "PolyText16",
    "ImageText8",
    "ImageText16",
    "CreateColormap",
    "FreeColormap",
    "CopyColormapAndFree",
    "InstallColormap",
    "UninstallColormap",
    "ListInstalledColormaps",
    "AllocColor",
    "AllocNamedColor",
    "AllocColorCells",
    "AllocColorPlanes",
    "FreeColors",
    "StoreColors",
    "StoreNamedColor",
    "QueryColors",
    "LookupColor",
    "CreateCursor",
    "CreateGlyphCursor",
    "FreeCursor",
    "RecolorCursor",
    "QueryBestSize",
    "QueryExtension",
    "ListExtensions",
    "ChangeKeyboardMapping",
    "GetKeyboardMapping",
    "ChangeKeyboardControl",
    "GetKeyboardControl",
    "Bell",
    "ChangePointerControl",
    "GetPointerControl",
    "SetScreenSaver",
    "GetScreenSaver",
    "ChangeHosts",
    "ListHosts",
    "SetAccessControl",
    "SetCloseDownMode",
    "KillClient",
    "RotateProperties",
    "ForceScreenSaver",
    "SetPointerMapping",
    "GetPointerMapping",
    "SetModifierMapping",
    "GetModifierMapping",
    "",
    "",
    "",
    "",
    "",
    "",
    "",
    "NoOperation",
];

/// Canonical name of a core request code, or "" if unknown.
///
/// Codes 128 and above belong to extensions and have no fixed name.
pub fn request_name(code: u8) -> &'static str {
    REQUEST_NAMES.get(code as usize).copied().unwrap_or("")
}

/// Description of a core protocol error code, in the wording Xlib uses
pub fn error_text(code: u8) -> &'static str {
    match code {
        1 => "BadRequest (invalid request code or no such operation)",
        2 => "BadValue (integer parameter out of range for operation)",
        3 => "BadWindow (invalid Window parameter)",
        4 => "BadPixmap (invalid Pixmap parameter)",
        5 => "BadAtom (invalid Atom parameter)",
        6 => "BadCursor (invalid Cursor parameter)",
        7 => "BadFont (invalid Font parameter)",
        8 => "BadMatch (invalid parameter attributes)",
        9 => "BadDrawable (invalid Pixmap or Window parameter)",
        10 => "BadAccess (attempt to access private resource denied)",
        11 => "BadAlloc (insufficient resources for operation)",
        12 => "BadColor (invalid Colormap parameter)",
        13 => "BadGC (invalid GC parameter)",
        14 => "BadIDChoice (invalid resource ID chosen for this connection)",
        15 => "BadName (named color or font does not exist)",
        16 => "BadLength (poly request too large or internal Xlib length error)",
        17 => "BadImplementation (server does not implement operation)",
        _ => "unknown error",
    }
}
